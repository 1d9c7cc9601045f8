
mod selection;

pub use selection::{
    AudioParameters, DEFAULT_MAX_MTU, DEFAULT_PAYLOAD_TYPE, RtpParameters, SelectedConfiguration,
    VideoParameters, encode_streaming_status,
};

use bytes::Bytes;
use shared::error::{Error, Result, flatten_errs};

use crate::message::{RequestKind, StreamingStatus};
use crate::sender::{MediaSender, StreamCommand};
use crate::session::{SessionId, SessionStore};

/// What a handled selection did to its session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamTransition {
    Started(SessionId),
    Reconfigured(SessionId),
    Stopped(SessionId),
}

/// Drives sessions through start, reconfigure and stop, owning the media
/// sender and the process-wide streaming status.
pub struct StreamController<S: MediaSender> {
    sender: S,
    status: StreamingStatus,
    max_concurrent_streams: Option<usize>,
}

fn process_failure(err: Error) -> Error {
    match err {
        Error::ErrStreamProcessFailure(_) => err,
        other => Error::ErrStreamProcessFailure(other.to_string()),
    }
}

impl<S: MediaSender> StreamController<S> {
    pub fn new(sender: S, max_concurrent_streams: Option<usize>) -> Self {
        Self {
            sender,
            status: StreamingStatus::Available,
            max_concurrent_streams,
        }
    }

    pub fn status(&self) -> StreamingStatus {
        self.status
    }

    /// Current status as a single-field TLV8 blob.
    pub fn get_streaming_status(&self) -> Bytes {
        encode_streaming_status(self.status)
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn sender_mut(&mut self) -> &mut S {
        &mut self.sender
    }

    /// Handles one selected stream configuration write.
    ///
    /// On error the store keeps its last consistent state; unknown request
    /// kinds change nothing at all.
    pub fn handle_selected_configuration(
        &mut self,
        raw: &[u8],
        sessions: &mut SessionStore,
    ) -> Result<StreamTransition> {
        let selection = SelectedConfiguration::decode(raw).inspect_err(|err| {
            log::error!("bad selected stream configuration request: {err}");
        })?;
        log::debug!(
            "selected stream configuration: {} session {}",
            selection.kind,
            selection.session_id
        );

        match selection.kind {
            RequestKind::Start | RequestKind::Reconfigure => self.start(&selection, sessions),
            RequestKind::Stop => self.stop(&selection.session_id, sessions),
        }
    }

    fn start(
        &mut self,
        selection: &SelectedConfiguration,
        sessions: &mut SessionStore,
    ) -> Result<StreamTransition> {
        let id = &selection.session_id;
        let streaming = sessions.streaming_count();
        let record = sessions.lookup_mut(id)?;

        if !record.is_streaming()
            && let Some(max) = self.max_concurrent_streams
            && streaming >= max
        {
            log::warn!("refusing to start session {id}: {streaming} of {max} streams in use");
            return Err(Error::ErrStreamingBusy);
        }

        let command = StreamCommand::new(
            id.clone(),
            record,
            selection.video.as_ref(),
            selection.audio.as_ref(),
        );

        let replaced = match record.detach() {
            Some(mut old) => {
                if let Err(err) = self.sender.stop(old.as_mut()) {
                    log::error!("failed to stop media sender of session {id}: {err}");
                    record.attach(old);
                    return Err(process_failure(err));
                }
                true
            }
            None => false,
        };

        let result = self.sender.start(&command);
        let transition = match result {
            Ok(process) => {
                log::info!(
                    "session {id} streaming {}x{}@{} {}kbps to {}:{}",
                    command.width,
                    command.height,
                    command.frame_rate,
                    command.bit_rate_kbps,
                    command.peer_address,
                    command.peer_port,
                );
                record.attach(process);
                if selection.kind == RequestKind::Reconfigure {
                    StreamTransition::Reconfigured(id.clone())
                } else {
                    StreamTransition::Started(id.clone())
                }
            }
            Err(err) => {
                log::error!("failed to start media sender for session {id}: {err}");
                if replaced {
                    self.refresh_status(sessions);
                }
                return Err(process_failure(err));
            }
        };

        self.refresh_status(sessions);
        Ok(transition)
    }

    fn stop(&mut self, id: &SessionId, sessions: &mut SessionStore) -> Result<StreamTransition> {
        let record = sessions.lookup_mut(id)?;
        if let Some(mut process) = record.detach() {
            if let Err(err) = self.sender.stop(process.as_mut()) {
                log::error!("failed to stop media sender of session {id}: {err}");
                record.attach(process);
                return Err(process_failure(err));
            }
        } else {
            log::debug!("session {id} stopped without a running stream");
        }

        sessions.remove(id);
        log::info!("session {id} stopped");
        self.refresh_status(sessions);
        Ok(StreamTransition::Stopped(id.clone()))
    }

    /// Stops every attached process and empties the store.
    pub fn stop_all(&mut self, sessions: &mut SessionStore) -> Result<()> {
        let mut errs = vec![];
        for id in sessions.ids() {
            if let Ok(record) = sessions.lookup_mut(&id)
                && let Some(mut process) = record.detach()
                && let Err(err) = self.sender.stop(process.as_mut())
            {
                // killed again when the record drops
                record.attach(process);
                errs.push(process_failure(err));
            }
            sessions.remove(&id);
        }
        self.refresh_status(sessions);
        if errs.len() == 1 {
            return Err(errs.remove(0));
        }
        flatten_errs(errs)
    }

    /// Recomputes the published status from the sessions currently streaming.
    pub(crate) fn refresh_status(&mut self, sessions: &SessionStore) -> StreamingStatus {
        let streaming = sessions.streaming_count();
        self.status = if streaming == 0 {
            StreamingStatus::Available
        } else if self
            .max_concurrent_streams
            .is_some_and(|max| streaming >= max)
        {
            StreamingStatus::InUse
        } else {
            StreamingStatus::Streaming
        };
        self.status
    }
}
