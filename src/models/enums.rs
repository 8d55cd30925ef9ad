use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ClientError;

/// Macro to generate enum with as_str + std::str::FromStr + string serde.
///
/// Parsing ignores ASCII case: the backend capitalises roles (`Admin`)
/// while list filters send them lower-case. The `else Other` form keeps
/// unknown values instead of failing a whole list.
macro_rules! str_enum {
    (@serde $name:ident) => {
        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ClientError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(if s.eq_ignore_ascii_case($s) {
                    return Ok(Self::$variant);
                })+
                Err(ClientError::InvalidEnum {
                    field: stringify!($name).into(),
                    value: s.into(),
                })
            }
        }

        str_enum!(@serde $name);
    };
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? } else Other) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $s,)+
                    Self::Other(raw) => raw.as_str(),
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ClientError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $(if s.eq_ignore_ascii_case($s) {
                    return Ok(Self::$variant);
                })+
                if s.is_empty() {
                    return Err(ClientError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: String::new(),
                    });
                }
                Ok(Self::Other(s.to_string()))
            }
        }

        str_enum!(@serde $name);
    };
}

str_enum!(Role {
    Admin => "admin",
    Doctor => "doctor",
    Nurse => "nurse",
    Receptionist => "receptionist",
    Pharmacist => "pharmacist",
    Inventory => "inventory",
    RoomManager => "roomManager",
    Technician => "technician",
    Patient => "patient",
} else Other);

str_enum!(AppointmentStatus {
    Scheduled => "scheduled",
    Confirmed => "confirmed",
    CheckedIn => "checked-in",
    Completed => "completed",
    Cancelled => "cancelled",
    Rescheduled => "rescheduled",
});

str_enum!(Timeframe {
    Day => "day",
    Month => "month",
    Year => "year",
});

str_enum!(RoomStatus {
    Available => "available",
    Occupied => "occupied",
    Maintenance => "maintenance",
    Reserved => "reserved",
});

str_enum!(RequirementStatus {
    Open => "open",
    InProgress => "inProgress",
    Fulfilled => "fulfilled",
    Cancelled => "cancelled",
});

str_enum!(TransactionType {
    In => "in",
    Out => "out",
    Adjust => "adjust",
    Fulfill => "fulfill",
} else Other);

str_enum!(InventoryKind {
    Medicine => "medicine",
    Blood => "blood",
    Equipment => "equipment",
} else Other);

str_enum!(ItemRequirementKind {
    Equipment => "equipment",
    Blood => "blood",
});

str_enum!(LeaveStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
} else Other);

impl Default for Timeframe {
    fn default() -> Self {
        Self::Day
    }
}

impl RequirementStatus {
    /// Fulfilled and cancelled requirements accept no further fulfillments.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Fulfilled | Self::Cancelled)
    }
}
