//! Network probes.

pub mod datagram;
