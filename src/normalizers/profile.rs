//! Patient profile, medications and conditions

use crate::config::EngineConfig;
use crate::schema::field::{is_sentinel, parse_integer, split_list};
use crate::types::{Medication, PatientProfile};
use std::collections::BTreeSet;
use tracing::debug;

use super::{split_parallel, DatedRecord};

const CONDITION_FIELDS: [&str; 2] = ["Chronic_Conditions", "Conditions"];

/// Builds the patient profile. Demographics and medications come from the
/// first record; conditions are collected from every record.
pub struct ProfileNormalizer;

impl ProfileNormalizer {
    pub fn normalize(
        patient_id: &str,
        records: &[DatedRecord<'_>],
        config: &EngineConfig,
    ) -> PatientProfile {
        let first = records.first().map(|d| d.record);

        let text = |key: &str| {
            first
                .and_then(|r| r.text(key))
                .filter(|v| !is_sentinel(v))
        };

        let medications = first
            .map(|record| {
                parse_medications(
                    split_parallel(record.text("Medication_Names")),
                    split_parallel(record.text("Medication_Dosages")),
                    split_parallel(record.text("Medication_Types")),
                    split_parallel(record.text("Medication_Categories")),
                    config.medication_name_limit,
                )
            })
            .unwrap_or_default();

        let conditions: BTreeSet<String> = records
            .iter()
            .flat_map(|dated| {
                CONDITION_FIELDS
                    .iter()
                    .filter_map(|key| dated.record.text(key))
                    .flat_map(|raw| split_list(&raw))
                    .collect::<Vec<_>>()
            })
            .filter(|c| !is_sentinel(c))
            .collect();

        PatientProfile {
            id: patient_id.to_string(),
            name: text("Name"),
            age: text("Age")
                .and_then(|a| parse_integer(&a))
                .and_then(|a| u32::try_from(a).ok()),
            gender: text("Gender"),
            medications,
            conditions,
        }
    }
}

fn non_placeholder(items: &[String], index: usize) -> Option<String> {
    items
        .get(index)
        .filter(|v| !v.is_empty() && !is_sentinel(v))
        .cloned()
}

/// Pair parallel lists by index, dropping empty, placeholder and overlong names
fn parse_medications(
    names: Vec<String>,
    dosages: Vec<String>,
    types: Vec<String>,
    categories: Vec<String>,
    name_limit: usize,
) -> Vec<Medication> {
    names
        .iter()
        .enumerate()
        .filter_map(|(index, name)| {
            if name.is_empty() || is_sentinel(name) || name.chars().count() > name_limit {
                debug!(index, "Discarding medication with unusable name");
                return None;
            }
            Some(Medication {
                name: name.clone(),
                dosage: non_placeholder(&dosages, index),
                medication_type: non_placeholder(&types, index),
                category: non_placeholder(&categories, index),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizers::dated_records;
    use crate::normalizers::test_support::make_record;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_profile_from_records() {
        let records = vec![
            make_record("2024-07-01")
                .with("Name", "Jordan Smith")
                .with("Age", 58.0)
                .with("Gender", "F")
                .with("Medication_Names", "Metformin; nan; Lisinopril; ")
                .with("Medication_Dosages", "500mg twice daily; ; 10mg daily")
                .with("Medication_Types", "Tablet; ; Tablet")
                .with("Chronic_Conditions", "Type 2 Diabetes; Hypertension"),
            make_record("2024-07-02")
                .with("Medication_Names", "Ignored")
                .with("Chronic_Conditions", "Hypertension; Obesity; null"),
        ];

        let profile =
            ProfileNormalizer::normalize("P001", &dated_records(&records), &EngineConfig::default());

        assert_eq!(profile.id, "P001");
        assert_eq!(profile.name.as_deref(), Some("Jordan Smith"));
        assert_eq!(profile.age, Some(58));
        assert_eq!(
            profile.medications,
            vec![
                Medication {
                    name: "Metformin".into(),
                    dosage: Some("500mg twice daily".into()),
                    medication_type: Some("Tablet".into()),
                    category: None,
                },
                Medication {
                    name: "Lisinopril".into(),
                    dosage: Some("10mg daily".into()),
                    medication_type: Some("Tablet".into()),
                    category: None,
                },
            ]
        );
        let conditions: Vec<&str> = profile.conditions.iter().map(String::as_str).collect();
        assert_eq!(conditions, vec!["Hypertension", "Obesity", "Type 2 Diabetes"]);
    }

    #[test]
    fn test_overlong_medication_name() {
        let long_name = "x".repeat(101);
        let meds = parse_medications(
            vec![long_name, "[object Object]".into(), "Aspirin".into()],
            Vec::new(),
            Vec::new(),
            Vec::new(),
            100,
        );
        assert_eq!(meds.len(), 1);
        assert_eq!(meds[0].name, "Aspirin");
        assert_eq!(meds[0].dosage, None);
    }

    #[test]
    fn test_empty_records() {
        let profile = ProfileNormalizer::normalize("P002", &[], &EngineConfig::default());
        assert!(profile.medications.is_empty());
        assert!(profile.conditions.is_empty());
        assert_eq!(profile.name, None);
    }
}
