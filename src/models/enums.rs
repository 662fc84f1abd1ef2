use serde::{Deserialize, Serialize};

/// Returned by `FromStr` when a wire name does not belong to the enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string literal doubles as the serde wire name.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $s)]
                $variant
            ),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// The closed set of lease-contract attributes every run tries to populate.
    ///
    /// Declaration order is the canonical field order: `Ord`, `ALL` and the
    /// result's `fields` vector all follow it. Wire names are the contract keys
    /// used in prompts and JSON output.
    TargetField {
        LocationCode => "Mahal_Kodu",
        Area => "M2",
        MinimumRent => "Asgari_Kira",
        RevenueShareRatio => "Ciro_Kira_Orani",
        DecorationCoordination => "Dekorasyon_Koordinasyon",
        LiabilityInsurance => "Mali_Sorumluluk_Sigortasi",
        LatePaymentInterest => "Gecikme_Faizi",
        ExtensionIncrease => "Bir_Yil_Uzama_Artis",
        ExtensionRevenueShare => "Bir_Yil_Uzama_Ciro_Kira",
        PenaltyAmount => "Ceza_Bedeli",
    }
);

impl TargetField {
    pub const COUNT: usize = 10;

    /// Shared field list for the pattern table, the prompt and the reconciler.
    pub const ALL: [TargetField; Self::COUNT] = [
        TargetField::LocationCode,
        TargetField::Area,
        TargetField::MinimumRent,
        TargetField::RevenueShareRatio,
        TargetField::DecorationCoordination,
        TargetField::LiabilityInsurance,
        TargetField::LatePaymentInterest,
        TargetField::ExtensionIncrease,
        TargetField::ExtensionRevenueShare,
        TargetField::PenaltyAmount,
    ];
}

str_enum!(
    /// Which extraction source decided a field's value.
    FieldSource {
        Pattern => "pattern",
        Model => "model",
        Unresolved => "unresolved",
    }
);

str_enum!(
    /// Which acquisition path produced the raw text.
    TextSource {
        Native => "native",
        Optical => "optical",
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn all_is_in_declaration_order() {
        let mut sorted = TargetField::ALL;
        sorted.sort();
        assert_eq!(sorted, TargetField::ALL);
    }

    #[test]
    fn all_has_no_duplicates() {
        let unique: std::collections::BTreeSet<_> = TargetField::ALL.iter().collect();
        assert_eq!(unique.len(), TargetField::COUNT);
    }

    #[test]
    fn wire_names_round_trip_through_from_str() {
        for field in TargetField::ALL {
            assert_eq!(TargetField::from_str(field.as_str()).unwrap(), field);
        }
    }

    #[test]
    fn unknown_wire_name_rejected() {
        let err = TargetField::from_str("Kira_Suresi").unwrap_err();
        assert_eq!(err.kind, "TargetField");
        assert_eq!(err.value, "Kira_Suresi");
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_string(&TargetField::MinimumRent).unwrap();
        assert_eq!(json, "\"Asgari_Kira\"");
        let json = serde_json::to_string(&FieldSource::Pattern).unwrap();
        assert_eq!(json, "\"pattern\"");
        let json = serde_json::to_string(&TextSource::Optical).unwrap();
        assert_eq!(json, "\"optical\"");
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(TargetField::Area.to_string(), "M2");
        assert_eq!(FieldSource::Unresolved.to_string(), "unresolved");
    }
}
