//! Aggregates derived from already-fetched documents.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::entities::{ProjectRecord, TeamMemberRecord, TestimonialRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialStats {
    pub total: usize,
    /// Mean rating rounded to one decimal; `0.0` when there are no testimonials.
    pub average_rating: f64,
    pub five_star: usize,
}

impl TestimonialStats {
    pub fn from_records(records: &[TestimonialRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let sum: u32 = records.iter().map(|record| u32::from(record.rating)).sum();
        let average = f64::from(sum) / records.len() as f64;

        Self {
            total: records.len(),
            average_rating: (average * 10.0).round() / 10.0,
            five_star: records.iter().filter(|record| record.rating >= 5).count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total: usize,
    pub featured: usize,
    pub clients: usize,
}

impl ProjectStats {
    pub fn from_records(records: &[ProjectRecord]) -> Self {
        let clients: BTreeSet<&str> = records
            .iter()
            .filter_map(|record| record.client.as_deref())
            .map(str::trim)
            .filter(|client| !client.is_empty())
            .collect();

        Self {
            total: records.len(),
            featured: records.iter().filter(|record| record.featured).count(),
            clients: clients.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub department: String,
    pub members: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub headcount: usize,
    /// Departments sorted by name; members without one are grouped under `Other`.
    pub departments: Vec<DepartmentCount>,
}

impl TeamStats {
    pub fn from_records(records: &[TeamMemberRecord]) -> Self {
        let mut departments: BTreeMap<&str, usize> = BTreeMap::new();
        for member in records {
            let department = member
                .department
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or("Other");
            *departments.entry(department).or_default() += 1;
        }

        Self {
            headcount: records.len(),
            departments: departments
                .into_iter()
                .map(|(department, members)| DepartmentCount {
                    department: department.to_string(),
                    members,
                })
                .collect(),
        }
    }
}
