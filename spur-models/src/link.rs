// Copyright (c) 2025 Graphcore Ltd. All rights reserved.

//! Bi-directional link with two ends (a & b).
//!
//! A [PointToPointLink] models a full-duplex cable: each direction is an
//! independent pipeline of a queue ([Store]), a serialization stage
//! ([Limiter]) and a propagation stage ([Delay]). All three stages are
//! configured from a [LinkProfile].
//!
//! # Ports
//!
//! This component has four ports:
//!  - Two [input ports](spur_engine::port::InPort): `rx_a`, `rx_b`,
//!  - Two [output ports](spur_engine::port::OutPort): `tx_a`, `tx_b`,

use std::rc::Rc;

use async_trait::async_trait;
use spur_components::delay::Delay;
use spur_components::limiter::Limiter;
use spur_components::store::Store;
use spur_components::{connect_port, rc_limiter};
use spur_engine::engine::Engine;
use spur_engine::port::ChannelResult;
use spur_engine::sim_error;
use spur_engine::time::Clock;
use spur_engine::traits::SimObject;
use spur_engine::types::{SimError, SimResult};
use spur_model_builder::{EntityDisplay, Runnable};
use spur_track::entity::Entity;

use crate::error::BuildError;

/// The characteristics shared by both directions of a link.
///
/// All three parameters are mandatory and the profile is immutable once
/// constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkProfile {
    bandwidth_bps: u64,
    delay_ns: u64,
    queue_packets: usize,
}

impl LinkProfile {
    /// Parse a profile from its textual form.
    ///
    /// `bandwidth` is a rate string ("10Mbps"), `delay` a duration string
    /// ("2ms") and `queue` a packet count ("100" or "100p"). An empty string
    /// for any of the three fails with [BuildError::MissingParameter] before
    /// anything is constructed.
    pub fn parse(bandwidth: &str, delay: &str, queue: &str) -> Result<Self, BuildError> {
        if delay.is_empty() {
            return Err(BuildError::MissingParameter("delay"));
        }
        if bandwidth.is_empty() {
            return Err(BuildError::MissingParameter("bandwidth"));
        }
        if queue.is_empty() {
            return Err(BuildError::MissingParameter("queue"));
        }

        Ok(Self {
            bandwidth_bps: parse_bandwidth(bandwidth)?,
            delay_ns: parse_delay(delay)?,
            queue_packets: parse_queue(queue)?,
        })
    }

    #[must_use]
    pub fn bandwidth_bps(&self) -> u64 {
        self.bandwidth_bps
    }

    #[must_use]
    pub fn delay_ns(&self) -> u64 {
        self.delay_ns
    }

    #[must_use]
    pub fn queue_packets(&self) -> usize {
        self.queue_packets
    }

    /// The serialization rate of this profile on the given clock.
    pub fn bits_per_tick(&self, clock: &Clock) -> Result<usize, SimError> {
        let ticks_per_second = clock.freq_mhz() * 1e6;
        let bits = (self.bandwidth_bps as f64 / ticks_per_second) as usize;
        if bits == 0 {
            return sim_error!(format!(
                "bandwidth {}bps is below one bit per tick of a {}MHz clock",
                self.bandwidth_bps,
                clock.freq_mhz()
            ));
        }
        Ok(bits)
    }

    /// The propagation delay of this profile in ticks of the given clock.
    #[must_use]
    pub fn delay_ticks(&self, clock: &Clock) -> usize {
        (self.delay_ns as f64 * clock.freq_mhz() / 1000.0).round() as usize
    }
}

fn parse_bandwidth(value: &str) -> Result<u64, BuildError> {
    let malformed = || BuildError::Malformed {
        field: "bandwidth",
        value: value.to_string(),
    };
    let (number, scale) = if let Some(n) = value.strip_suffix("Gbps") {
        (n, 1_000_000_000)
    } else if let Some(n) = value.strip_suffix("Mbps") {
        (n, 1_000_000)
    } else if let Some(n) = value.strip_suffix("Kbps") {
        (n, 1_000)
    } else if let Some(n) = value.strip_suffix("bps") {
        (n, 1)
    } else {
        return Err(malformed());
    };
    let number: u64 = number.parse().map_err(|_| malformed())?;
    Ok(number * scale)
}

fn parse_delay(value: &str) -> Result<u64, BuildError> {
    let malformed = || BuildError::Malformed {
        field: "delay",
        value: value.to_string(),
    };
    // "ns"/"us"/"ms" must be tried before the bare "s" suffix.
    let (number, scale) = if let Some(n) = value.strip_suffix("ns") {
        (n, 1)
    } else if let Some(n) = value.strip_suffix("us") {
        (n, 1_000)
    } else if let Some(n) = value.strip_suffix("ms") {
        (n, 1_000_000)
    } else if let Some(n) = value.strip_suffix('s') {
        (n, 1_000_000_000)
    } else {
        return Err(malformed());
    };
    let number: u64 = number.parse().map_err(|_| malformed())?;
    Ok(number * scale)
}

fn parse_queue(value: &str) -> Result<usize, BuildError> {
    let malformed = || BuildError::Malformed {
        field: "queue",
        value: value.to_string(),
    };
    let number = value.strip_suffix('p').unwrap_or(value);
    number.parse().map_err(|_| malformed())
}

#[derive(EntityDisplay, Runnable)]
pub struct PointToPointLink<T>
where
    T: SimObject,
{
    pub entity: Rc<Entity>,
    profile: LinkProfile,

    store_a: Rc<Store<T>>,
    delay_a: Rc<Delay<T>>,
    store_b: Rc<Store<T>>,
    delay_b: Rc<Delay<T>>,
}

impl<T> PointToPointLink<T>
where
    T: SimObject,
{
    pub fn new_and_register(
        engine: &Engine,
        clock: &Clock,
        parent: &Rc<Entity>,
        name: &str,
        profile: &LinkProfile,
    ) -> Result<Rc<Self>, SimError> {
        let entity = Rc::new(Entity::new(parent, name));
        let bits_per_tick = profile.bits_per_tick(clock)?;
        let delay_ticks = profile.delay_ticks(clock);
        let limiter = rc_limiter!(clock, bits_per_tick);

        let store_a = Store::new_and_register(engine, &entity, "buf_a", profile.queue_packets())?;
        let limiter_a = Limiter::new_and_register(engine, &entity, "limit_a", limiter.clone())?;
        let delay_a = Delay::new_and_register(engine, clock, &entity, "a", delay_ticks)?;
        connect_port!(store_a, tx => limiter_a, rx)?;
        connect_port!(limiter_a, tx => delay_a, rx)?;

        let store_b = Store::new_and_register(engine, &entity, "buf_b", profile.queue_packets())?;
        let limiter_b = Limiter::new_and_register(engine, &entity, "limit_b", limiter)?;
        let delay_b = Delay::new_and_register(engine, clock, &entity, "b", delay_ticks)?;
        connect_port!(store_b, tx => limiter_b, rx)?;
        connect_port!(limiter_b, tx => delay_b, rx)?;

        let rc_self = Rc::new(Self {
            entity,
            profile: profile.clone(),
            store_a,
            delay_a,
            store_b,
            delay_b,
        });
        engine.register(rc_self.clone());
        Ok(rc_self)
    }

    /// The profile this link was installed with.
    #[must_use]
    pub fn profile(&self) -> &LinkProfile {
        &self.profile
    }

    pub fn connect_port_tx_a(&self, channel: ChannelResult<T>) -> SimResult {
        self.delay_a.connect_port_tx(channel)
    }

    pub fn connect_port_tx_b(&self, channel: ChannelResult<T>) -> SimResult {
        self.delay_b.connect_port_tx(channel)
    }

    pub fn port_rx_a(&self) -> ChannelResult<T> {
        self.store_a.port_rx()
    }

    pub fn port_rx_b(&self) -> ChannelResult<T> {
        self.store_b.port_rx()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_profile() {
        let profile = LinkProfile::parse("10Mbps", "2ms", "100p").unwrap();
        assert_eq!(profile.bandwidth_bps(), 10_000_000);
        assert_eq!(profile.delay_ns(), 2_000_000);
        assert_eq!(profile.queue_packets(), 100);
    }

    #[test]
    fn parse_suffix_variants() {
        assert_eq!(
            LinkProfile::parse("1Gbps", "1us", "8").unwrap().bandwidth_bps(),
            1_000_000_000
        );
        assert_eq!(
            LinkProfile::parse("500Kbps", "30ns", "8").unwrap().delay_ns(),
            30
        );
        assert_eq!(
            LinkProfile::parse("100bps", "1s", "8").unwrap().delay_ns(),
            1_000_000_000
        );
    }

    #[test]
    fn missing_parameters_in_order() {
        assert!(matches!(
            LinkProfile::parse("10Mbps", "", "100"),
            Err(BuildError::MissingParameter("delay"))
        ));
        assert!(matches!(
            LinkProfile::parse("", "2ms", "100"),
            Err(BuildError::MissingParameter("bandwidth"))
        ));
        assert!(matches!(
            LinkProfile::parse("10Mbps", "2ms", ""),
            Err(BuildError::MissingParameter("queue"))
        ));
        // All three missing reports the delay first.
        assert!(matches!(
            LinkProfile::parse("", "", ""),
            Err(BuildError::MissingParameter("delay"))
        ));
    }

    #[test]
    fn malformed_parameters() {
        assert!(matches!(
            LinkProfile::parse("fast", "2ms", "100"),
            Err(BuildError::Malformed { field: "bandwidth", .. })
        ));
        assert!(matches!(
            LinkProfile::parse("10Mbps", "soon", "100"),
            Err(BuildError::Malformed { field: "delay", .. })
        ));
        assert!(matches!(
            LinkProfile::parse("10Mbps", "2ms", "many"),
            Err(BuildError::Malformed { field: "queue", .. })
        ));
    }

    #[test]
    fn clock_conversions() {
        use spur_engine::time::Clock;

        // 1MHz clock: one tick per microsecond.
        let clock = Clock::new(1.0);
        let profile = LinkProfile::parse("10Mbps", "2ms", "100").unwrap();
        assert_eq!(profile.bits_per_tick(&clock).unwrap(), 10);
        assert_eq!(profile.delay_ticks(&clock), 2000);
    }

    #[test]
    fn bandwidth_below_clock_resolution() {
        use spur_engine::time::Clock;

        let clock = Clock::new(1.0);
        let profile = LinkProfile::parse("100bps", "1ms", "10").unwrap();
        assert!(profile.bits_per_tick(&clock).is_err());
    }
}
