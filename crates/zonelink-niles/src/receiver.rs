//! The receiver communication manager.
//!
//! [`NilesReceiver`] owns everything needed to drive one chassis: the
//! transport, the command queue, the single worker task that is the only
//! code ever touching the wire, the zone registry, and the event channel.
//!
//! # Command queue
//!
//! All operations -- caller requests and the poller's refreshes -- are
//! expressed as [`Command`]s pushed onto an unbounded mpsc queue.
//! Producers never block; completion is observed later through zone events,
//! not return values. The worker drains the queue strictly in order, so
//! two commands for the same receiver never interleave on the wire.
//!
//! # Activation
//!
//! The protocol addresses control and query commands at the receiver's
//! single "active control zone". The worker tracks activation
//! acknowledgments (`rznc,4,<zone>`) and skips the activation write when
//! the target zone is already active. It never waits for the ack
//! synchronously: the queue is FIFO and single-threaded, so any command
//! behind the activation naturally serializes after it.
//!
//! # Failure policy
//!
//! An error executing one command is logged and the loop moves on -- one
//! bad command must never stall the queue. A transport-level failure
//! additionally triggers a single reconnect attempt (close, pause,
//! reopen); if that fails the receiver stays in the `Error` state and each
//! later write repeats the attempt. No error crosses the collaborator
//! boundary from the worker task.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use zonelink_core::error::{Error, Result};
use zonelink_core::events::ZoneEvent;
use zonelink_core::transport::Transport;
use zonelink_core::types::{ConnectionState, ReceiverInfo};

use crate::commands::{self, Function};
use crate::models::NilesModel;
use crate::poller;
use crate::protocol::{self, ResponseEvent};
use crate::reconcile::{self, SourceLabels};
use crate::registry::ZoneRegistry;
use crate::zone::{Zone, ZoneHandle, ZoneOptions};

/// A queued operation for the worker.
///
/// Commands are immutable once enqueued and execute in submission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Write a payload to the wire, `repeat` times with `repeat_delay`
    /// pacing between writes (no trailing delay). Repetition exists
    /// because the protocol has no absolute-volume command, only steps.
    Write {
        payload: Vec<u8>,
        repeat: u32,
        repeat_delay: Duration,
    },
    /// Refresh status for every registered zone.
    PollAll,
    /// Refresh status for one zone (activate + query, inline).
    PollZone(u8),
    /// Make a zone the active control zone, if it is not already.
    ActivateZone(u8),
    /// Mute every powered-on, unmuted zone, then resynchronize.
    MuteAll,
    /// Sentinel: wake the worker so it can observe the stop request.
    Shutdown,
}

/// Pacing and timeout knobs, set through the builder.
#[derive(Debug, Clone)]
pub(crate) struct ReceiverConfig {
    /// Settle time between consecutive commands of one poll cycle.
    pub command_pause: Duration,
    /// Default pacing between repeated writes (volume steps).
    pub repeat_delay: Duration,
    /// Settle timeout for the post-write reply drain.
    pub read_settle: Duration,
    /// Pause between closing a failed transport and reopening it.
    pub reconnect_pause: Duration,
    /// Bound on waiting for the worker to exit during `stop()`.
    pub join_timeout: Duration,
    /// Full-poll interval; zero disables the poller.
    pub poll_interval: Duration,
}

/// Factory for (re)opening the transport; `None` for caller-provided
/// transports, which cannot be reopened.
pub(crate) type Connector =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<Box<dyn Transport>>> + Send>> + Send + Sync>;

/// State shared between the receiver facade, the worker, and the poller.
#[derive(Debug)]
pub(crate) struct Shared {
    connection: Mutex<ConnectionState>,
    last_poll: Mutex<Option<Instant>>,
}

impl Shared {
    fn new() -> Self {
        Shared {
            connection: Mutex::new(ConnectionState::Disconnected),
            last_poll: Mutex::new(None),
        }
    }

    pub(crate) fn connection_state(&self) -> ConnectionState {
        *self.connection.lock()
    }

    fn set_connection_state(&self, state: ConnectionState) {
        *self.connection.lock() = state;
    }

    pub(crate) fn mark_polled(&self) {
        *self.last_poll.lock() = Some(Instant::now());
    }

    pub(crate) fn last_poll(&self) -> Option<Instant> {
        *self.last_poll.lock()
    }

    /// Whether a full poll is due given the configured interval.
    ///
    /// A receiver that has never completed a poll is always due.
    pub(crate) fn poll_due(&self, interval: Duration) -> bool {
        if interval.is_zero() {
            return false;
        }
        match self.last_poll() {
            None => true,
            Some(at) => at.elapsed() >= interval,
        }
    }
}

/// Handles owned while the receiver is running.
struct RuntimeHandles {
    cmd_tx: mpsc::UnboundedSender<Command>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
    poller: Option<JoinHandle<()>>,
}

/// Driver for one Niles ZR receiver chassis.
///
/// Constructed via [`NilesBuilder`](crate::builder::NilesBuilder). Request
/// methods validate their input, enqueue wire commands, and return
/// immediately; results surface through [`ZoneEvent`]s.
pub struct NilesReceiver {
    model: NilesModel,
    info: ReceiverInfo,
    labels: SourceLabels,
    config: ReceiverConfig,
    registry: ZoneRegistry,
    event_tx: broadcast::Sender<ZoneEvent>,
    transport: Arc<AsyncMutex<Option<Box<dyn Transport>>>>,
    connector: Option<Connector>,
    shared: Arc<Shared>,
    runtime: Mutex<Option<RuntimeHandles>>,
}

impl NilesReceiver {
    /// Assemble a receiver from its parts. Called by the builder.
    pub(crate) fn new(
        model: NilesModel,
        endpoint: String,
        labels: SourceLabels,
        config: ReceiverConfig,
        connector: Option<Connector>,
        transport: Option<Box<dyn Transport>>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let info = ReceiverInfo {
            model_name: model.name.to_string(),
            endpoint,
        };
        NilesReceiver {
            model,
            info,
            labels,
            config,
            registry: ZoneRegistry::new(),
            event_tx,
            transport: Arc::new(AsyncMutex::new(transport)),
            connector,
            shared: Arc::new(Shared::new()),
            runtime: Mutex::new(None),
        }
    }

    // -------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------

    /// Open the transport, spawn the worker, and queue an initial full
    /// poll.
    ///
    /// On a connection failure the receiver transitions to the `Error`
    /// state, no worker is spawned, and the error is returned. Calling
    /// `start()` on a running receiver is a no-op.
    pub async fn start(&self) -> Result<()> {
        if self.runtime.lock().is_some() {
            debug!(receiver = %self.info, "already started");
            return Ok(());
        }

        self.shared.set_connection_state(ConnectionState::Connecting);

        let have_transport = self.transport.lock().await.is_some();
        if !have_transport {
            let connector = self.connector.as_ref().ok_or_else(|| {
                self.shared.set_connection_state(ConnectionState::Error);
                Error::Connection("no transport or serial endpoint configured".into())
            })?;
            match (connector.as_ref())().await {
                Ok(t) => {
                    *self.transport.lock().await = Some(t);
                }
                Err(e) => {
                    self.shared.set_connection_state(ConnectionState::Error);
                    return Err(e);
                }
            }
        }

        self.shared.set_connection_state(ConnectionState::Connected);
        let _ = self.event_tx.send(ZoneEvent::Connected);

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let worker = Worker {
            model: self.model.clone(),
            config: self.config.clone(),
            labels: self.labels.clone(),
            registry: self.registry.clone(),
            event_tx: self.event_tx.clone(),
            transport: Arc::clone(&self.transport),
            connector: self.connector.clone(),
            shared: Arc::clone(&self.shared),
            cancel: cancel.clone(),
            active_control_zone: 0,
            rx_buf: Vec::new(),
        };
        let worker_handle = tokio::spawn(worker.run(cmd_rx));

        let poller_handle = if self.config.poll_interval.is_zero() {
            None
        } else {
            Some(tokio::spawn(poller::run(
                cancel.clone(),
                self.config.poll_interval,
                Arc::clone(&self.shared),
                cmd_tx.clone(),
            )))
        };

        // Queue the initial full poll before handing the sender out.
        let _ = cmd_tx.send(Command::PollAll);

        *self.runtime.lock() = Some(RuntimeHandles {
            cmd_tx,
            cancel,
            worker: worker_handle,
            poller: poller_handle,
        });

        info!(receiver = %self.info, "receiver started");
        Ok(())
    }

    /// Stop the worker and close the transport.
    ///
    /// Signals the cancellation token, pushes a shutdown sentinel to wake
    /// the worker, and joins it with a bounded timeout -- aborting the
    /// task on overrun so `stop()` can never hang. The transport is closed
    /// regardless of how the join ended.
    pub async fn stop(&self) {
        let Some(handles) = self.runtime.lock().take() else {
            debug!(receiver = %self.info, "stop on a receiver that was not running");
            self.close_transport().await;
            self.shared.set_connection_state(ConnectionState::Disconnected);
            return;
        };

        handles.cancel.cancel();
        let _ = handles.cmd_tx.send(Command::Shutdown);

        let abort = handles.worker.abort_handle();
        if tokio::time::timeout(self.config.join_timeout, handles.worker)
            .await
            .is_err()
        {
            warn!(receiver = %self.info, "worker did not exit within join timeout, aborting");
            abort.abort();
        }

        if let Some(poller) = handles.poller {
            poller.abort();
        }

        self.close_transport().await;
        self.shared.set_connection_state(ConnectionState::Disconnected);
        let _ = self.event_tx.send(ZoneEvent::Disconnected);
        info!(receiver = %self.info, "receiver stopped");
    }

    async fn close_transport(&self) {
        let mut guard = self.transport.lock().await;
        if let Some(t) = guard.as_mut() {
            if let Err(e) = t.close().await {
                warn!(receiver = %self.info, error = %e, "transport close failed");
            }
        }
        *guard = None;
    }

    // -------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------

    /// Static information about this receiver.
    pub fn info(&self) -> &ReceiverInfo {
        &self.info
    }

    /// The model definition this receiver was built for.
    pub fn model(&self) -> &NilesModel {
        &self.model
    }

    /// The current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.shared.connection_state()
    }

    /// When the last successful full poll completed.
    pub fn last_poll(&self) -> Option<Instant> {
        self.shared.last_poll()
    }

    /// The display label configured for a source, falling back to the
    /// bare source number.
    pub fn source_label(&self, source: u8) -> String {
        self.labels.label_for(source)
    }

    /// Subscribe to zone and connection events.
    pub fn subscribe(&self) -> broadcast::Receiver<ZoneEvent> {
        self.event_tx.subscribe()
    }

    // -------------------------------------------------------------------
    // Zone registration
    // -------------------------------------------------------------------

    /// Register a zone, creating its handle.
    ///
    /// May be called before or after `start()`; an existing registration
    /// for the same number is replaced.
    pub fn register_zone(&self, number: u8, options: ZoneOptions) -> Result<ZoneHandle> {
        commands::validate_zone(&self.model, number)?;
        let handle = Zone::new(number, options);
        self.registry.register(handle.clone());
        debug!(zone = number, "registered zone");
        Ok(handle)
    }

    /// Unregister a zone by number. Unknown numbers are ignored.
    pub fn unregister_zone(&self, number: u8) {
        if self.registry.unregister(number) {
            debug!(zone = number, "unregistered zone");
        }
    }

    /// Look up a registered zone's handle.
    pub fn zone(&self, number: u8) -> Option<ZoneHandle> {
        self.registry.get(number)
    }

    // -------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------

    /// Power a zone on (selecting its current source) or off.
    pub fn set_zone_power(&self, zone: u8, on: bool) -> Result<()> {
        commands::validate_zone(&self.model, zone)?;
        let payload = if on {
            let source = self.current_source(zone);
            commands::cmd_power_on(zone, source)
        } else {
            commands::cmd_power_off(zone)
        };
        self.enqueue_write(payload);
        self.enqueue(Command::PollZone(zone));
        Ok(())
    }

    /// Toggle a zone's power state based on its snapshot.
    pub fn toggle_zone_power(&self, zone: u8) -> Result<()> {
        commands::validate_zone(&self.model, zone)?;
        let on = self
            .registry
            .get(zone)
            .map(|z| z.is_powered_on())
            .unwrap_or(false);
        self.set_zone_power(zone, !on)
    }

    /// Select a zone's input source (1-6). Also powers the zone on.
    pub fn set_zone_source(&self, zone: u8, source: u8) -> Result<()> {
        commands::validate_zone(&self.model, zone)?;
        commands::validate_source(&self.model, source)?;
        self.enqueue_write(commands::cmd_select_source(zone, source));
        self.enqueue(Command::PollZone(zone));
        Ok(())
    }

    /// Set a zone's absolute volume.
    ///
    /// Translated into repeated paced volume-up/down steps from the
    /// snapshot's current level; a target equal to the current level
    /// produces no wire traffic at all.
    pub fn set_zone_volume(&self, zone: u8, target: u8) -> Result<()> {
        commands::validate_zone(&self.model, zone)?;
        commands::validate_volume(&self.model, target)?;

        let current = self.registry.get(zone).map(|z| z.volume()).unwrap_or(0);
        let Some((function, steps)) = commands::volume_steps(current, target) else {
            trace!(zone, target, "volume already at target");
            return Ok(());
        };

        debug!(zone, current, target, steps, "stepping volume");
        self.enqueue(Command::Write {
            payload: protocol::encode_zone_function(zone, function.code()),
            repeat: steps,
            repeat_delay: self.config.repeat_delay,
        });
        self.enqueue(Command::PollZone(zone));
        Ok(())
    }

    /// Adjust a zone's volume by a number of steps (positive = up).
    pub fn adjust_zone_volume(&self, zone: u8, delta: i16) -> Result<()> {
        commands::validate_zone(&self.model, zone)?;
        if delta == 0 {
            return Ok(());
        }
        let steps = delta.unsigned_abs() as u32;
        if steps > self.model.max_volume as u32 {
            return Err(Error::InvalidParameter(format!(
                "volume adjustment {delta} exceeds the 0-{} scale",
                self.model.max_volume
            )));
        }

        let function = if delta > 0 {
            Function::VolumeUp
        } else {
            Function::VolumeDown
        };
        self.enqueue(Command::Write {
            payload: protocol::encode_zone_function(zone, function.code()),
            repeat: steps,
            repeat_delay: self.config.repeat_delay,
        });
        self.enqueue(Command::PollZone(zone));
        Ok(())
    }

    /// Set a zone's volume from a 0-100 percentage (dimmer-style input).
    pub fn set_zone_volume_percent(&self, zone: u8, percent: u8) -> Result<()> {
        if percent > 100 {
            return Err(Error::InvalidParameter(format!(
                "percentage {percent} out of range 0-100"
            )));
        }
        self.set_zone_volume(zone, commands::volume_from_percent(percent, &self.model))
    }

    /// Set a zone's mute state.
    ///
    /// The protocol only has a mute toggle, so the command is issued only
    /// when the snapshot disagrees with the requested state.
    pub fn set_zone_mute(&self, zone: u8, muted: bool) -> Result<()> {
        commands::validate_zone(&self.model, zone)?;
        let currently = self
            .registry
            .get(zone)
            .map(|z| z.is_muted())
            .unwrap_or(false);
        if currently != muted {
            self.enqueue_write(commands::cmd_mute_toggle(zone));
            self.enqueue(Command::PollZone(zone));
        }
        Ok(())
    }

    /// Toggle a zone's mute state.
    pub fn toggle_zone_mute(&self, zone: u8) -> Result<()> {
        commands::validate_zone(&self.model, zone)?;
        self.enqueue_write(commands::cmd_mute_toggle(zone));
        self.enqueue(Command::PollZone(zone));
        Ok(())
    }

    /// Turn every zone off, then refresh all zone status.
    pub fn all_zones_off(&self) {
        self.enqueue_write(protocol::encode_all_zones_off());
        self.enqueue(Command::PollAll);
    }

    /// Mute every registered zone that is powered on and not muted.
    pub fn mute_all_zones(&self) {
        self.enqueue(Command::MuteAll);
    }

    /// Tune the built-in tuner to a station (FM `###.#` or AM `####`).
    pub fn tune_station(&self, station: &str) -> Result<()> {
        commands::validate_station(station)?;
        self.enqueue_write(protocol::encode_tune_station(station.trim()));
        Ok(())
    }

    /// Send a raw protocol command (the CR terminator is appended).
    pub fn send_raw(&self, command: &str) {
        self.enqueue_write(protocol::encode_raw(command));
    }

    /// Queue a status refresh for one zone.
    pub fn poll_zone(&self, zone: u8) -> Result<()> {
        commands::validate_zone(&self.model, zone)?;
        self.enqueue(Command::PollZone(zone));
        Ok(())
    }

    /// Queue a status refresh for every registered zone.
    pub fn poll_all_zones(&self) {
        self.enqueue(Command::PollAll);
    }

    /// Queue a full poll if the configured interval has elapsed.
    ///
    /// This is the collaborator-facing tick; the internal poller performs
    /// the same check on its own schedule. An interval of zero disables
    /// both.
    pub fn poll_if_due(&self) {
        if self.shared.poll_due(self.config.poll_interval) {
            debug!(receiver = %self.info, "poll interval elapsed, queueing status refresh");
            self.enqueue(Command::PollAll);
        }
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    /// A zone's current source from its snapshot, sanitized onto the
    /// model's source range.
    fn current_source(&self, zone: u8) -> u8 {
        self.registry
            .get(zone)
            .map(|z| z.source())
            .unwrap_or(1)
            .clamp(1, self.model.source_count)
    }

    fn enqueue_write(&self, payload: Vec<u8>) {
        self.enqueue(Command::Write {
            payload,
            repeat: 1,
            repeat_delay: self.config.repeat_delay,
        });
    }

    /// Best-effort enqueue. A receiver that is not running silently drops
    /// commands -- failures surface through connection state, never as
    /// errors on the request path.
    fn enqueue(&self, command: Command) {
        let guard = self.runtime.lock();
        match guard.as_ref() {
            Some(handles) => {
                if handles.cmd_tx.send(command).is_err() {
                    debug!(receiver = %self.info, "command queue closed, dropping command");
                }
            }
            None => {
                debug!(receiver = %self.info, "receiver not running, dropping command");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// The single consumer of a receiver's command queue.
///
/// Owns all wire I/O and all snapshot mutation. `active_control_zone` and
/// the partial-line buffer live here and die with the worker.
struct Worker {
    model: NilesModel,
    config: ReceiverConfig,
    labels: SourceLabels,
    registry: ZoneRegistry,
    event_tx: broadcast::Sender<ZoneEvent>,
    transport: Arc<AsyncMutex<Option<Box<dyn Transport>>>>,
    connector: Option<Connector>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    /// The zone the receiver currently addresses; 0 = none/unknown.
    active_control_zone: u8,
    /// Carry-over for reply bytes split across read drains.
    rx_buf: Vec<u8>,
}

impl Worker {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
        debug!("worker started");
        loop {
            let command = tokio::select! {
                _ = self.cancel.cancelled() => break,
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => cmd,
                    // All senders dropped: the receiver went away.
                    None => break,
                },
            };

            if command == Command::Shutdown {
                break;
            }

            trace!(?command, "executing command");
            if let Err(e) = self.execute(command).await {
                warn!(error = %e, "command failed, continuing with queue");
            }
        }
        debug!("worker exiting");
    }

    async fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Write {
                payload,
                repeat,
                repeat_delay,
            } => self.write_repeated(&payload, repeat, repeat_delay).await,
            Command::ActivateZone(zone) => self.activate_zone(zone).await,
            Command::PollZone(zone) => self.poll_zone(zone).await,
            Command::PollAll => self.poll_all().await,
            Command::MuteAll => self.mute_all().await,
            Command::Shutdown => Ok(()),
        }
    }

    /// Write `payload` `repeat` times with pacing, checking for a stop
    /// request between iterations.
    async fn write_repeated(&mut self, payload: &[u8], repeat: u32, delay: Duration) -> Result<()> {
        let repeat = repeat.max(1);
        for i in 0..repeat {
            if self.cancel.is_cancelled() {
                break;
            }
            self.write_and_read(payload).await?;
            if i + 1 < repeat {
                self.pause_for(delay).await;
            }
        }
        Ok(())
    }

    /// One physical write followed by a reply drain.
    async fn write_and_read(&mut self, payload: &[u8]) -> Result<()> {
        let send_result = {
            let mut guard = self.transport.lock().await;
            match guard.as_mut() {
                Some(t) => t.send(payload).await,
                None => Err(Error::NotConnected),
            }
        };

        if let Err(e) = send_result {
            if e.is_transport_failure() {
                self.reconnect().await;
            }
            return Err(e);
        }

        self.read_replies().await;
        Ok(())
    }

    /// Drain whatever the receiver sent, decode complete lines, and apply
    /// the events. Partial lines stay buffered for the next drain.
    async fn read_replies(&mut self) {
        let drained = {
            let mut guard = self.transport.lock().await;
            let Some(t) = guard.as_mut() else {
                return;
            };
            t.read_available(self.config.read_settle).await
        };

        match drained {
            Ok(raw) => {
                if raw.is_empty() {
                    return;
                }
                self.rx_buf.extend_from_slice(&raw);
                let events = protocol::decode_all(&mut self.rx_buf);
                for event in events {
                    self.apply_event(event);
                }
            }
            Err(e) => {
                warn!(error = %e, "reply drain failed");
                if e.is_transport_failure() {
                    self.reconnect().await;
                }
            }
        }
    }

    fn apply_event(&mut self, event: ResponseEvent) {
        match event {
            ResponseEvent::ZoneActivated { zone } => {
                debug!(zone, "receiver acknowledged active control zone");
                self.active_control_zone = zone;
            }
            ResponseEvent::ZoneStatus(status) => {
                let Some(zone) = self.registry.get(status.zone) else {
                    debug!(zone = status.zone, "status for unregistered zone, ignoring");
                    return;
                };
                let changes = reconcile::apply_status(&zone, &status, &self.labels);
                if changes.is_empty() {
                    return;
                }
                trace!(zone = zone.number(), ?changes, "zone state changed");
                let projection = if zone.has_dimmer_projection() {
                    reconcile::dimmer_projection(&zone, &changes, self.model.max_volume)
                } else {
                    None
                };
                for change in changes {
                    let _ = self.event_tx.send(change.into_event(zone.number()));
                }
                if let Some((percent, on)) = projection {
                    let _ = self.event_tx.send(ZoneEvent::BrightnessChanged {
                        zone: zone.number(),
                        percent,
                    });
                    let _ = self.event_tx.send(ZoneEvent::SwitchChanged {
                        zone: zone.number(),
                        on,
                    });
                }
            }
        }
    }

    /// Make `zone` the active control zone, unless it already is.
    async fn activate_zone(&mut self, zone: u8) -> Result<()> {
        if self.active_control_zone == zone {
            trace!(zone, "zone already active, skipping activation");
            return Ok(());
        }
        debug!(zone, "activating zone for control");
        self.write_and_read(&protocol::encode_activate_zone(zone))
            .await
    }

    /// Activate + query one zone, inline so the pair stays adjacent on
    /// the wire.
    async fn poll_zone(&mut self, zone: u8) -> Result<()> {
        self.activate_zone(zone).await?;
        self.pause_for(self.config.command_pause).await;
        self.write_and_read(&protocol::encode_query_status()).await
    }

    /// Poll every registered zone in registry order, then record the
    /// completed poll.
    async fn poll_all(&mut self) -> Result<()> {
        for zone in self.registry.zone_numbers() {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            self.activate_zone(zone).await?;
            self.pause_for(self.config.command_pause).await;
            self.write_and_read(&protocol::encode_query_status())
                .await?;
            self.pause_for(self.config.command_pause).await;
        }
        self.shared.mark_polled();
        Ok(())
    }

    /// Mute every powered-on, unmuted zone, then resynchronize with a
    /// full poll.
    async fn mute_all(&mut self) -> Result<()> {
        for zone in self.registry.handles() {
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            let snap = zone.snapshot();
            if snap.powered && !snap.muted {
                debug!(zone = zone.number(), "muting zone");
                self.write_and_read(&commands::cmd_mute_toggle(zone.number()))
                    .await?;
                self.pause_for(self.config.command_pause).await;
            }
        }
        self.poll_all().await
    }

    /// One reconnect attempt: close, pause, reopen.
    ///
    /// Failure leaves the receiver in the `Error` state; the next write's
    /// own failure will try again.
    async fn reconnect(&mut self) {
        warn!("transport failure, attempting reconnect");
        self.shared.set_connection_state(ConnectionState::Error);
        let _ = self.event_tx.send(ZoneEvent::Disconnected);
        self.rx_buf.clear();

        {
            let mut guard = self.transport.lock().await;
            if let Some(t) = guard.as_mut() {
                if let Err(e) = t.close().await {
                    debug!(error = %e, "close before reconnect failed");
                }
            }
            *guard = None;
        }

        let Some(connector) = self.connector.clone() else {
            warn!("no reconnect path configured, receiver stays in error state");
            return;
        };

        self.pause_for(self.config.reconnect_pause).await;
        if self.cancel.is_cancelled() {
            return;
        }

        let _ = self.event_tx.send(ZoneEvent::Reconnecting { attempt: 1 });
        match (connector.as_ref())().await {
            Ok(t) => {
                *self.transport.lock().await = Some(t);
                self.shared.set_connection_state(ConnectionState::Connected);
                let _ = self.event_tx.send(ZoneEvent::Connected);
                info!("reconnected to receiver");
            }
            Err(e) => {
                warn!(error = %e, "reconnect failed, receiver stays in error state");
            }
        }
    }

    /// Sleep that wakes early when a stop is requested.
    async fn pause_for(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}
