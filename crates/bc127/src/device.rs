//! Bc127 -- the synchronous module handle.
//!
//! [`Bc127`] owns a [`CommandEngine`] and exposes one method per module
//! feature. Every method runs a single exchange: resync, write, wait for the
//! status line. Channel failures come back as `Err`; what the module said
//! comes back as an [`OpResult`] (or a [`GetReply`] for reads).

use tracing::{debug, info};

use bc127_core::channel::ByteChannel;
use bc127_core::clock::Clock;
use bc127_core::error::Result;
use bc127_core::types::{AudioCommand, BaudRate, BleRole, ClassicRole, OpResult};
use bc127_protocol::{CommandEngine, EngineConfig, Exchange, GetReply, SpeedChange};

use crate::commands;

/// A BC127 module reached through channel `C`, timed by clock `K`.
pub struct Bc127<C, K> {
    engine: CommandEngine<C, K>,
}

impl<C: ByteChannel, K: Clock> Bc127<C, K> {
    /// Wrap a channel and clock with the default timeouts.
    pub fn new(channel: C, clock: K) -> Self {
        Self::with_config(channel, clock, EngineConfig::default())
    }

    pub fn with_config(channel: C, clock: K, config: EngineConfig) -> Self {
        Bc127 {
            engine: CommandEngine::with_config(channel, clock, config),
        }
    }

    pub fn engine(&self) -> &CommandEngine<C, K> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut CommandEngine<C, K> {
        &mut self.engine
    }

    pub fn config(&self) -> &EngineConfig {
        self.engine.config()
    }

    /// Give back the channel and clock.
    pub fn into_parts(self) -> (C, K) {
        self.engine.into_parts()
    }

    // ---------------------------------------------------------------
    // Generic exchanges
    // ---------------------------------------------------------------

    /// Flush any half-entered command and stale output.
    pub fn resync(&mut self) -> Result<OpResult> {
        self.engine.resync()
    }

    /// Run a prepared exchange, such as one from [`commands`].
    pub fn run(&mut self, exchange: Exchange) -> Result<GetReply> {
        self.engine.run(exchange)
    }

    /// Send a bare command word and wait for `OK` or `ERROR`.
    pub fn command(&mut self, token: &str) -> Result<OpResult> {
        self.engine.command(token)
    }

    /// Write a module parameter.
    pub fn set_param(&mut self, name: &str, value: &str) -> Result<OpResult> {
        self.engine.set_param(name, value)
    }

    /// Read a module parameter.
    pub fn get_param(&mut self, name: &str) -> Result<GetReply> {
        self.engine.get_param(name)
    }

    // ---------------------------------------------------------------
    // Maintenance
    // ---------------------------------------------------------------

    /// Reboot the module and wait for its `Ready` banner.
    pub fn reset(&mut self) -> Result<OpResult> {
        self.simple(commands::cmd_reset())
    }

    /// Return every setting to its factory default.
    pub fn restore(&mut self) -> Result<OpResult> {
        self.simple(commands::cmd_restore())
    }

    /// Persist the current settings so they survive a reset.
    pub fn write_config(&mut self) -> Result<OpResult> {
        self.simple(commands::cmd_write_config())
    }

    // ---------------------------------------------------------------
    // Roles and radio
    // ---------------------------------------------------------------

    /// Select the BLE role. Takes effect after [`write_config`](Self::write_config)
    /// and [`reset`](Self::reset).
    pub fn set_ble_role(&mut self, role: BleRole) -> Result<OpResult> {
        self.simple(commands::cmd_set_ble_role(role))
    }

    pub fn ble_disable(&mut self) -> Result<OpResult> {
        self.set_ble_role(BleRole::Disabled)
    }

    pub fn ble_peripheral(&mut self) -> Result<OpResult> {
        self.set_ble_role(BleRole::Peripheral)
    }

    pub fn ble_central(&mut self) -> Result<OpResult> {
        self.set_ble_role(BleRole::Central)
    }

    /// Start or stop BLE advertising.
    pub fn advertise(&mut self, on: bool) -> Result<OpResult> {
        self.simple(commands::cmd_advertise(on))
    }

    /// Select whether the module receives (sink) or sends (source) audio.
    pub fn set_classic_role(&mut self, role: ClassicRole) -> Result<OpResult> {
        self.simple(commands::cmd_set_classic_role(role))
    }

    /// Send an audio transport control to the connected peer.
    pub fn music(&mut self, command: AudioCommand) -> Result<OpResult> {
        self.simple(commands::cmd_music(command))
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Read the module's Bluetooth address.
    pub fn address_query(&mut self) -> Result<GetReply> {
        self.engine.run(commands::cmd_query_address())
    }

    /// Read the module's configured line rate.
    pub fn baud_rate_query(&mut self) -> Result<GetReply> {
        self.engine.run(commands::cmd_query_baud_rate())
    }

    // ---------------------------------------------------------------
    // Line rate
    // ---------------------------------------------------------------

    /// Ask the module to switch to `bps`.
    ///
    /// The host side of the link is left alone; call
    /// [`follow_baud_rate`](Self::follow_baud_rate) once the change is
    /// accepted or unconfirmed.
    pub fn set_baud_rate(&mut self, bps: u32) -> Result<SpeedChange> {
        self.engine.change_speed(bps)
    }

    /// Switch the host side of the channel to `bps`.
    ///
    /// Fails with [`Error::InvalidParameter`](bc127_core::Error::InvalidParameter)
    /// for a rate the module cannot use.
    pub fn follow_baud_rate(&mut self, bps: u32) -> Result<()> {
        let rate = BaudRate::try_from(bps)?;
        info!(bps = rate.bps(), "following module to new baud rate");
        self.engine.channel_mut().reconfigure_baud_rate(rate.bps())
    }

    fn simple(&mut self, exchange: Exchange) -> Result<OpResult> {
        let reply = self.engine.run(exchange)?;
        if !reply.result.is_success() {
            debug!(result = %reply.result, "module did not accept command");
        }
        Ok(reply.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc127_core::Error;
    use bc127_test_harness::{MockChannel, MockClock, SimulatedModule};

    fn simulated() -> (Bc127<MockChannel, MockClock>, MockClock) {
        let clock = MockClock::new();
        let channel = SimulatedModule::new().into_channel(clock.clone());
        (Bc127::new(channel, clock.clone()), clock)
    }

    fn scripted() -> (Bc127<MockChannel, MockClock>, MockClock) {
        let clock = MockClock::new();
        let channel = MockChannel::new(clock.clone());
        (Bc127::new(channel, clock.clone()), clock)
    }

    fn written(module: &Bc127<MockChannel, MockClock>) -> Vec<Vec<u8>> {
        module.engine().channel().sent_data()
    }

    #[test]
    fn every_exchange_starts_with_resync_probe() {
        let (mut module, _clock) = simulated();
        assert_eq!(module.write_config().unwrap(), OpResult::Success);
        assert_eq!(module.advertise(true).unwrap(), OpResult::Success);
        assert_eq!(
            written(&module),
            vec![
                b"\r".to_vec(),
                b"WRITE\r".to_vec(),
                b"\r".to_vec(),
                b"ADVERTISING ON\r".to_vec(),
            ]
        );
    }

    #[test]
    fn reset_succeeds_on_ready_banner() {
        let (mut module, _clock) = simulated();
        assert_eq!(module.reset().unwrap(), OpResult::Success);
    }

    #[test]
    fn restore_and_write() {
        let (mut module, _clock) = simulated();
        assert_eq!(module.restore().unwrap(), OpResult::Success);
        assert_eq!(module.write_config().unwrap(), OpResult::Success);
    }

    #[test]
    fn ble_role_round_trip() {
        let (mut module, _clock) = simulated();
        assert_eq!(module.ble_central().unwrap(), OpResult::Success);
        let reply = module.get_param("BLE_ROLE").unwrap();
        assert_eq!(reply.into_value().as_deref(), Some("2"));

        assert_eq!(module.ble_disable().unwrap(), OpResult::Success);
        let reply = module.get_param("BLE_ROLE").unwrap();
        assert_eq!(reply.into_value().as_deref(), Some("0"));

        assert_eq!(module.ble_peripheral().unwrap(), OpResult::Success);
        let reply = module.get_param("BLE_ROLE").unwrap();
        assert_eq!(reply.into_value().as_deref(), Some("1"));
    }

    #[test]
    fn classic_role_round_trip() {
        let (mut module, _clock) = simulated();
        assert_eq!(
            module.set_classic_role(ClassicRole::Source).unwrap(),
            OpResult::Success
        );
        let reply = module.get_param("CLASSIC_ROLE").unwrap();
        assert_eq!(reply.into_value().as_deref(), Some("1"));
    }

    #[test]
    fn music_commands_accepted() {
        let (mut module, _clock) = simulated();
        for command in [
            AudioCommand::Play,
            AudioCommand::Pause,
            AudioCommand::VolumeUp,
            AudioCommand::Stop,
        ] {
            assert_eq!(module.music(command).unwrap(), OpResult::Success);
        }
    }

    #[test]
    fn address_query_returns_value() {
        let (mut module, _clock) = simulated();
        let reply = module.address_query().unwrap();
        assert_eq!(reply.result, OpResult::Success);
        assert_eq!(reply.into_value().as_deref(), Some("20FABB000001"));
    }

    #[test]
    fn unknown_command_is_module_error() {
        let (mut module, _clock) = simulated();
        assert_eq!(module.command("FROB").unwrap(), OpResult::ModuleError);
        let reply = module.get_param("NOPE").unwrap();
        assert_eq!(reply.result, OpResult::ModuleError);
        assert_eq!(reply.into_value(), None);
    }

    #[test]
    fn set_baud_rate_confirmed_at_old_rate() {
        let (mut module, _clock) = simulated();
        let change = module.set_baud_rate(38400).unwrap();
        assert!(change.is_confirmed());
        assert_eq!(change.rate(), Some(BaudRate::B38400));

        let reply = module.baud_rate_query().unwrap();
        assert_eq!(reply.into_value().as_deref(), Some("38400"));
    }

    #[test]
    fn set_baud_rate_rejects_unsupported_rate() {
        let (mut module, _clock) = simulated();
        let change = module.set_baud_rate(14400).unwrap();
        assert_eq!(change.result, OpResult::InvalidParam);
        assert!(written(&module).is_empty());
    }

    #[test]
    fn unconfirmed_speed_change_then_follow() {
        let (mut module, clock) = scripted();
        let channel = module.engine_mut().channel_mut();
        channel.expect(b"\r", b"ERROR\n\r");
        // Acknowledgment sent at the new rate arrives as noise.
        channel.expect_delayed(b"SET BAUD=115200\r", &[0xF8, 0x00, 0x80], 3);

        let change = module.set_baud_rate(115_200).unwrap();
        assert!(change.is_unconfirmed());
        assert!(!change.is_confirmed());
        assert_eq!(clock.now(), 2000);

        module.follow_baud_rate(115_200).unwrap();
        assert_eq!(module.engine().channel().baud_rate(), Some(115_200));
    }

    #[test]
    fn follow_rejects_unsupported_rate() {
        let (mut module, _clock) = scripted();
        let err = module.follow_baud_rate(1200).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert_eq!(module.engine().channel().baud_rate(), None);
    }

    #[test]
    fn silent_module_times_out() {
        let (mut module, clock) = scripted();
        assert_eq!(module.write_config().unwrap(), OpResult::Timeout);
        // 1000 ms resync window, then the 3000 ms command deadline.
        assert_eq!(clock.now(), 4000);
    }

    #[test]
    fn channel_failure_is_an_error() {
        let (mut module, _clock) = scripted();
        module.engine_mut().channel_mut().set_connected(false);
        assert!(matches!(module.reset(), Err(Error::NotConnected)));
    }

    #[test]
    fn run_prepared_exchange() {
        let (mut module, _clock) = simulated();
        let reply = module.run(commands::cmd_query_baud_rate()).unwrap();
        assert_eq!(reply.into_value().as_deref(), Some("9600"));
    }
}
