use std::fmt::{Display, Formatter};

use enumflags2::BitFlags;

/// A pin number as known by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Pin(pub u32);

impl Display for Pin {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "gpio{}", self.0)
    }
}

impl From<u32> for Pin {
    fn from(it: u32) -> Self {
        Pin(it)
    }
}

/// Logical value of a line, after any active-low inversion done by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Inactive,
    Active,
}

impl Value {
    /// Parse the single ASCII byte stored in a sysfs value file.
    pub fn from_ascii(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(Value::Inactive),
            b'1' => Some(Value::Active),
            _ => None,
        }
    }

    pub fn as_ascii(self) -> u8 {
        match self {
            Value::Inactive => b'0',
            Value::Active => b'1',
        }
    }

    pub fn is_active(self) -> bool {
        self == Value::Active
    }
}

impl From<bool> for Value {
    fn from(active: bool) -> Self {
        if active {
            Value::Active
        } else {
            Value::Inactive
        }
    }
}

impl From<Value> for bool {
    fn from(it: Value) -> Self {
        it.is_active()
    }
}

impl From<Value> for u8 {
    fn from(it: Value) -> Self {
        match it {
            Value::Inactive => 0,
            Value::Active => 1,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Transitions which make a pin's value file report readiness.
#[repr(u8)]
#[enumflags2::bitflags(default = Rising | Falling)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeType {
    /// Inactive to active
    Rising,
    /// Active to inactive
    Falling,
}

/// Combined edge flags. Empty means no interrupt, both flags mean any change.
pub type Edge = BitFlags<EdgeType>;

pub(crate) fn edge_setting(edge: Edge) -> &'static str {
    if edge.is_all() {
        "both"
    } else if edge.contains(EdgeType::Rising) {
        "rising"
    } else if edge.contains(EdgeType::Falling) {
        "falling"
    } else {
        "none"
    }
}

/// Whether a high voltage reads as [`Value::Active`] or [`Value::Inactive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogicLevel {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl LogicLevel {
    pub(crate) fn setting(self) -> &'static str {
        match self {
            LogicLevel::ActiveHigh => "0",
            LogicLevel::ActiveLow => "1",
        }
    }
}

/// Direction of a pin, outputs carry their initial value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out(Value),
}

impl Direction {
    pub(crate) fn setting(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out(Value::Inactive) => "low",
            Direction::Out(Value::Active) => "high",
        }
    }
}

/// A change observed on a watched pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Notification {
    pub pin: Pin,
    pub value: Value,
}

impl Display for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} read {}", self.pin, self.value)
    }
}
