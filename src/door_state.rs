use std::fmt;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DoorPosition {
    Closed,
    Open,
    InTransition,
    Unknown,
}

impl DoorPosition {
    /// Interpret the end-stop switches. Both pressed at once is physically
    /// impossible and is reported as `Unknown`, never `Closed`.
    pub fn from_switches(closed_pressed: bool, open_pressed: bool) -> Self {
        match (closed_pressed, open_pressed) {
            (true, false) => DoorPosition::Closed,
            (false, true) => DoorPosition::Open,
            (false, false) => DoorPosition::InTransition,
            (true, true) => DoorPosition::Unknown,
        }
    }

    pub fn is_closed(self) -> bool {
        self == DoorPosition::Closed
    }
}

impl fmt::Display for DoorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorPosition::Closed => f.write_str("Closed"),
            DoorPosition::Open => f.write_str("Open"),
            DoorPosition::InTransition => f.write_str("In transition"),
            DoorPosition::Unknown => f.write_str("Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_combinations() {
        assert_eq!(DoorPosition::from_switches(true, false), DoorPosition::Closed);
        assert_eq!(DoorPosition::from_switches(false, true), DoorPosition::Open);
        assert_eq!(
            DoorPosition::from_switches(false, false),
            DoorPosition::InTransition
        );
        assert_eq!(DoorPosition::from_switches(true, true), DoorPosition::Unknown);
    }
}
