//! Async facade over a [`Bc127`].
//!
//! The command engine blocks its thread while it polls the channel, so the
//! device is moved onto a dedicated worker from Tokio's blocking pool. Async
//! callers talk to it through an mpsc queue: each [`Request`] carries a
//! oneshot sender for its reply, and the worker processes one request at a
//! time. Exchanges from concurrent tasks are therefore never interleaved on
//! the wire.
//!
//! ```no_run
//! use bc127::{Bc127Builder, Bc127Io};
//!
//! # async fn example() -> bc127::Result<()> {
//! let module = Bc127Builder::new().serial_port("/dev/ttyUSB0").build()?;
//! let io = Bc127Io::spawn(module);
//! let addr = io.address_query().await?.into_value();
//! let module = io.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use bc127_core::channel::ByteChannel;
use bc127_core::clock::Clock;
use bc127_core::error::{Error, Result};
use bc127_core::types::{AudioCommand, BleRole, ClassicRole, OpResult};
use bc127_protocol::{Exchange, GetReply, SpeedChange};

use crate::commands;
use crate::device::Bc127;

/// Requests queued before callers start waiting on the worker.
const QUEUE_DEPTH: usize = 32;

/// A request sent from [`Bc127Io`] to the worker.
pub enum Request {
    /// Run one exchange.
    Run {
        exchange: Exchange,
        reply: oneshot::Sender<Result<GetReply>>,
    },
    /// Resync without a following command.
    Resync {
        reply: oneshot::Sender<Result<OpResult>>,
    },
    /// Ask the module to change line rate.
    ChangeSpeed {
        bps: u32,
        reply: oneshot::Sender<Result<SpeedChange>>,
    },
    /// Reconfigure the host side of the channel.
    FollowBaudRate {
        bps: u32,
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Handle to a [`Bc127`] running on a blocking worker.
pub struct Bc127Io<C, K> {
    tx: mpsc::Sender<Request>,
    task: JoinHandle<Bc127<C, K>>,
}

impl<C, K> Bc127Io<C, K>
where
    C: ByteChannel + Send + 'static,
    K: Clock + Send + 'static,
{
    /// Move `device` onto a blocking worker.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(device: Bc127<C, K>) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        let task = tokio::task::spawn_blocking(move || io_worker(device, rx));
        Bc127Io { tx, task }
    }

    /// Stop the worker once queued requests finish and recover the device.
    pub async fn shutdown(self) -> Result<Bc127<C, K>> {
        drop(self.tx);
        self.task
            .await
            .map_err(|e| Error::Transport(format!("IO worker failed: {e}")))
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<Result<T>>) -> Request) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| Error::NotConnected)?;
        match reply_rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::NotConnected),
        }
    }

    /// Run a prepared exchange.
    pub async fn run(&self, exchange: Exchange) -> Result<GetReply> {
        self.call(|reply| Request::Run { exchange, reply }).await
    }

    async fn simple(&self, exchange: Exchange) -> Result<OpResult> {
        Ok(self.run(exchange).await?.result)
    }

    pub async fn resync(&self) -> Result<OpResult> {
        self.call(|reply| Request::Resync { reply }).await
    }

    pub async fn command(&self, token: &str) -> Result<OpResult> {
        self.simple(Exchange::command(token)).await
    }

    pub async fn set_param(&self, name: &str, value: &str) -> Result<OpResult> {
        self.simple(Exchange::set(name, value)).await
    }

    pub async fn get_param(&self, name: &str) -> Result<GetReply> {
        self.run(Exchange::get(name)).await
    }

    pub async fn reset(&self) -> Result<OpResult> {
        self.simple(commands::cmd_reset()).await
    }

    pub async fn restore(&self) -> Result<OpResult> {
        self.simple(commands::cmd_restore()).await
    }

    pub async fn write_config(&self) -> Result<OpResult> {
        self.simple(commands::cmd_write_config()).await
    }

    pub async fn set_ble_role(&self, role: BleRole) -> Result<OpResult> {
        self.simple(commands::cmd_set_ble_role(role)).await
    }

    pub async fn advertise(&self, on: bool) -> Result<OpResult> {
        self.simple(commands::cmd_advertise(on)).await
    }

    pub async fn set_classic_role(&self, role: ClassicRole) -> Result<OpResult> {
        self.simple(commands::cmd_set_classic_role(role)).await
    }

    pub async fn music(&self, command: AudioCommand) -> Result<OpResult> {
        self.simple(commands::cmd_music(command)).await
    }

    pub async fn address_query(&self) -> Result<GetReply> {
        self.run(commands::cmd_query_address()).await
    }

    pub async fn baud_rate_query(&self) -> Result<GetReply> {
        self.run(commands::cmd_query_baud_rate()).await
    }

    /// See [`Bc127::set_baud_rate`].
    pub async fn set_baud_rate(&self, bps: u32) -> Result<SpeedChange> {
        self.call(|reply| Request::ChangeSpeed { bps, reply }).await
    }

    /// See [`Bc127::follow_baud_rate`].
    pub async fn follow_baud_rate(&self, bps: u32) -> Result<()> {
        self.call(|reply| Request::FollowBaudRate { bps, reply }).await
    }
}

/// Worker loop. Runs on the blocking pool until every sender is dropped.
fn io_worker<C: ByteChannel, K: Clock>(
    mut device: Bc127<C, K>,
    mut rx: mpsc::Receiver<Request>,
) -> Bc127<C, K> {
    debug!("BC127 IO worker started");
    while let Some(request) = rx.blocking_recv() {
        handle_request(&mut device, request);
    }
    debug!("BC127 IO worker stopped");
    device
}

fn handle_request<C: ByteChannel, K: Clock>(device: &mut Bc127<C, K>, request: Request) {
    // A caller that stopped waiting drops its receiver; the send error is moot.
    match request {
        Request::Run { exchange, reply } => {
            trace!(kind = ?exchange.kind(), "worker running exchange");
            let _ = reply.send(device.run(exchange));
        }
        Request::Resync { reply } => {
            let _ = reply.send(device.resync());
        }
        Request::ChangeSpeed { bps, reply } => {
            let _ = reply.send(device.set_baud_rate(bps));
        }
        Request::FollowBaudRate { bps, reply } => {
            let _ = reply.send(device.follow_baud_rate(bps));
        }
    }
}
