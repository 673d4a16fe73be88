pub mod device;
pub mod report;
pub mod topology;

pub use device::*;
pub use report::*;
pub use topology::*;

/// Interface naming shared by the sanitizer and the topology canonicalizer
pub mod port_names {
    /// Management-interface spellings found on hardware appliances, in the
    /// order they are rewritten
    pub const MANAGEMENT_SPELLINGS: &[&str] = &["Management1", "Management0"];

    /// Management interface on the container image, wired to adapter 0
    pub const CONTAINER_MANAGEMENT: &str = "Management0";

    /// Case-insensitive prefix marking a management port in LLDP data
    pub const MANAGEMENT_PREFIX: &str = "management";

    /// Reserved extra data-plane port standing in for management traffic
    pub const RESERVED_PORT: &str = "ethernet0";
}
