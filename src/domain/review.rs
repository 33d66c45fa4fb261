use serde::Serialize;

use super::fetch::StopReason;

/// One review (or profile) pulled from a page fragment. Missing markup
/// leaves the field empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewRecord {
    pub rating: String,
    pub date: String,
    pub title: String,
    pub role: String,
    pub pros: String,
    pub cons: String,
    pub recommends: String,
    pub approval: String,
    pub outlook: String,
}

impl ReviewRecord {
    pub const FIELD_NAMES: [&'static str; 9] = [
        "rating",
        "date",
        "title",
        "role",
        "pros",
        "cons",
        "recommends",
        "approval",
        "outlook",
    ];

    /// Field values in `FIELD_NAMES` order, for tabular export.
    pub fn values(&self) -> [&str; 9] {
        [
            self.rating.as_str(),
            self.date.as_str(),
            self.title.as_str(),
            self.role.as_str(),
            self.pros.as_str(),
            self.cons.as_str(),
            self.recommends.as_str(),
            self.approval.as_str(),
            self.outlook.as_str(),
        ]
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        Self::FIELD_NAMES
            .iter()
            .position(|name| *name == field)
            .map(|idx| self.values()[idx])
    }
}

pub fn yes_no(flag: bool) -> String {
    match flag {
        true => "Yes".to_string(),
        false => "No".to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub records: Vec<ReviewRecord>,
    pub stop_reason: StopReason,
    /// Page the run stopped on, `None` when the page budget ran out.
    pub stopped_at_page: Option<u32>,
    pub last_status: Option<u16>,
    /// Requests issued by the page fetcher, cooldown retries included.
    pub requests_issued: usize,
}

#[cfg(test)]
mod tests {
    use super::ReviewRecord;

    #[test]
    fn serializes_fields_in_export_order() {
        let record = ReviewRecord {
            rating: "4,0".to_string(),
            title: "Bonne ambiance".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_string(&record).unwrap();
        let positions: Vec<usize> = ReviewRecord::FIELD_NAMES
            .iter()
            .map(|name| json.find(&format!("\"{}\"", name)).unwrap())
            .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", json);
    }

    #[test]
    fn absent_fields_are_empty_strings() {
        let record = ReviewRecord::default();

        assert!(record.values().iter().all(|v| v.is_empty()));
        assert_eq!(record.get("outlook"), Some(""));
        assert_eq!(record.get("salary"), None);
    }
}
