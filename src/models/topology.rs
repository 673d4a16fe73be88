use std::fmt;

use serde::{Deserialize, Serialize};

/// Edge is one adjacency as observed by neighbor discovery.
/// Directional as reported, logically undirected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub switch_a: String,
    pub port_a: String,
    pub switch_b: String,
    pub port_b: String,
}

impl Edge {
    pub fn new(
        switch_a: impl Into<String>,
        port_a: impl Into<String>,
        switch_b: impl Into<String>,
        port_b: impl Into<String>,
    ) -> Self {
        Self {
            switch_a: switch_a.into(),
            port_a: port_a.into(),
            switch_b: switch_b.into(),
            port_b: port_b.into(),
        }
    }

    /// True when `other` is this edge observed from the opposite end
    pub fn is_reverse_of(&self, other: &Edge) -> bool {
        self.switch_a == other.switch_b
            && self.switch_b == other.switch_a
            && self.port_a == other.port_b
            && self.port_b == other.port_a
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} <-> {}:{}",
            self.switch_a, self.port_a, self.switch_b, self.port_b
        )
    }
}

/// One side of a lab link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkEndpoint {
    pub node_id: String,
    pub adapter_number: u32,
    pub port_number: u32,
}

/// Canvas position of a lab node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanvasPosition {
    pub x: i32,
    pub y: i32,
}
