use serde::{Deserialize, Serialize};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
///
/// The first literal is the canonical wire form; any extra literals are
/// accepted on input only.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal $(| $alias:literal)*),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s $(, alias = $alias)*)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s $(| $alias)* => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(BoundingRegion {
    TopLeft => "top-left" | "top_left",
    TopRight => "top-right" | "top_right",
    Center => "center" | "centre",
    BottomLeft => "bottom-left" | "bottom_left",
    BottomRight => "bottom-right" | "bottom_right",
});

str_enum!(Confidence {
    High => "high" | "High",
    Medium => "medium" | "Medium",
    Low => "low" | "Low",
});

str_enum!(ItemType {
    Objective => "Objective" | "objective",
    KeyResult => "KeyResult" | "key_result",
    ActionItem => "ActionItem" | "action_item",
    Owner => "Owner" | "owner",
    Date => "Date" | "date",
    Metric => "Metric" | "metric",
    Risk => "Risk" | "risk",
    Note => "Note" | "note",
    Unknown => "Unknown" | "unknown",
});

// The classification prompt spells the ordering edge "preceding".
str_enum!(RelationType {
    Contributes => "contributes",
    DependsOn => "depends_on",
    OwnedBy => "owned_by",
    Precedes => "precedes" | "preceding",
});

// Three-step scale used for priority, influence, interest and severity.
str_enum!(Level {
    High => "High" | "high",
    Medium => "Medium" | "medium",
    Low => "Low" | "low",
});

impl Level {
    /// Numeric rank, High = 3.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_accepts_prompt_spelling() {
        let parsed: RelationType = serde_json::from_str("\"preceding\"").unwrap();
        assert_eq!(parsed, RelationType::Precedes);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"precedes\"");
    }

    #[test]
    fn bbox_round_trips_kebab_case() {
        let parsed: BoundingRegion = serde_json::from_str("\"bottom-right\"").unwrap();
        assert_eq!(parsed, BoundingRegion::BottomRight);
        assert_eq!(parsed.as_str(), "bottom-right");
    }

    #[test]
    fn unknown_bbox_rejected() {
        assert!(serde_json::from_str::<BoundingRegion>("\"somewhere\"").is_err());
    }

    #[test]
    fn from_str_reports_field() {
        let err = "Bogus".parse::<ItemType>().unwrap_err();
        assert!(err.to_string().contains("ItemType"));
        assert!(err.to_string().contains("Bogus"));
    }

    #[test]
    fn from_str_accepts_alias() {
        assert_eq!("key_result".parse::<ItemType>().unwrap(), ItemType::KeyResult);
        assert_eq!("low".parse::<Level>().unwrap(), Level::Low);
    }

    #[test]
    fn level_rank_orders_high_first() {
        assert!(Level::High.rank() > Level::Medium.rank());
        assert!(Level::Medium.rank() > Level::Low.rank());
    }
}
