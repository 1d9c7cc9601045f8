//! Recording media sender for unit tests.

use std::sync::{Arc, Mutex};

use shared::error::{Error, Result};

use super::{MediaSender, StreamCommand, StreamProcess};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Call {
    Start(StreamCommand),
    Stop(Option<u32>),
}

#[derive(Default)]
pub(crate) struct Live {
    current: usize,
    max: usize,
}

#[derive(Default, Clone)]
pub(crate) struct MockSender {
    pub(crate) calls: Arc<Mutex<Vec<Call>>>,
    pub(crate) live: Arc<Mutex<Live>>,
    pub(crate) next_id: u32,
    pub(crate) fail_start: bool,
    pub(crate) fail_stop: bool,
}

impl MockSender {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn max_live(&self) -> usize {
        self.live.lock().unwrap().max
    }

    pub(crate) fn live_count(&self) -> usize {
        self.live.lock().unwrap().current
    }
}

#[derive(Debug)]
struct MockProcess {
    id: u32,
    live: Arc<Mutex<Live>>,
    killed: bool,
}

impl std::fmt::Debug for Live {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Live({}/{})", self.current, self.max)
    }
}

impl StreamProcess for MockProcess {
    fn id(&self) -> Option<u32> {
        Some(self.id)
    }

    fn kill(&mut self) -> Result<()> {
        if !self.killed {
            self.killed = true;
            self.live.lock().unwrap().current -= 1;
        }
        Ok(())
    }
}

impl MediaSender for MockSender {
    fn start(&mut self, command: &StreamCommand) -> Result<Box<dyn StreamProcess>> {
        if self.fail_start {
            return Err(Error::Other("no camera".to_string()));
        }
        self.calls.lock().unwrap().push(Call::Start(command.clone()));
        self.next_id += 1;
        {
            let mut live = self.live.lock().unwrap();
            live.current += 1;
            live.max = live.max.max(live.current);
        }
        Ok(Box::new(MockProcess {
            id: self.next_id,
            live: Arc::clone(&self.live),
            killed: false,
        }))
    }

    fn stop(&mut self, process: &mut dyn StreamProcess) -> Result<()> {
        if self.fail_stop {
            return Err(Error::ErrStreamProcessFailure("kill refused".to_string()));
        }
        self.calls.lock().unwrap().push(Call::Stop(process.id()));
        process.kill()
    }
}
