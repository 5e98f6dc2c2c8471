use crate::db;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CALENDAR_KEY: &str = "setup.calendar";

/// Month (1-12) on which each cuatrimestre starts. The third term wraps
/// around the new year and runs until the first term starts again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSettings {
    pub term1_start_month: u32,
    pub term2_start_month: u32,
    pub term3_start_month: u32,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            term1_start_month: 3,
            term2_start_month: 7,
            term3_start_month: 11,
        }
    }
}

impl CalendarSettings {
    pub fn validate(&self) -> Result<(), String> {
        for (key, m) in [
            ("term1StartMonth", self.term1_start_month),
            ("term2StartMonth", self.term2_start_month),
            ("term3StartMonth", self.term3_start_month),
        ] {
            if !(1..=12).contains(&m) {
                return Err(format!("{} must be in 1..=12", key));
            }
        }
        if !(self.term1_start_month < self.term2_start_month
            && self.term2_start_month < self.term3_start_month)
        {
            return Err("term start months must be strictly increasing".into());
        }
        Ok(())
    }

    /// Applies a partial JSON patch; unknown fields are rejected.
    pub fn merge_patch(&mut self, patch: &Map<String, Value>) -> Result<(), String> {
        let mut next = *self;
        for (k, v) in patch {
            let n = v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| format!("{} must be integer", k))?;
            match k.as_str() {
                "term1StartMonth" => next.term1_start_month = n,
                "term2StartMonth" => next.term2_start_month = n,
                "term3StartMonth" => next.term3_start_month = n,
                _ => return Err(format!("unknown calendar field: {}", k)),
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    pub fn load(conn: &Connection) -> anyhow::Result<Self> {
        let mut current = Self::default();
        if let Some(saved) = db::settings_get_json(conn, CALENDAR_KEY)? {
            // A malformed saved section falls back to defaults.
            let merged = match saved.as_object() {
                Some(obj) => current.merge_patch(obj),
                None => Err("saved calendar is not an object".to_string()),
            };
            if let Err(reason) = merged {
                tracing::warn!(key = CALENDAR_KEY, %reason, "ignoring saved calendar settings");
            }
        }
        Ok(current)
    }

    pub fn save(&self, conn: &Connection) -> anyhow::Result<()> {
        db::settings_set_json(conn, CALENDAR_KEY, &serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patch_rejects_unknown_and_out_of_order_fields() {
        let mut cal = CalendarSettings::default();
        let bad = json!({ "term2StartMonth": 2 });
        assert!(cal.merge_patch(bad.as_object().expect("obj")).is_err());
        assert_eq!(cal, CalendarSettings::default());

        let unknown = json!({ "holidays": 3 });
        assert!(cal.merge_patch(unknown.as_object().expect("obj")).is_err());

        let good = json!({ "term1StartMonth": 2, "term3StartMonth": 10 });
        cal.merge_patch(good.as_object().expect("obj")).expect("patch");
        assert_eq!(cal.term1_start_month, 2);
        assert_eq!(cal.term3_start_month, 10);
    }

    #[test]
    fn saved_calendar_is_loaded_back() {
        let conn = crate::testutil::workspace();
        assert_eq!(CalendarSettings::load(&conn).expect("load"), CalendarSettings::default());
        let cal = CalendarSettings {
            term1_start_month: 2,
            term2_start_month: 6,
            term3_start_month: 10,
        };
        cal.save(&conn).expect("save");
        assert_eq!(CalendarSettings::load(&conn).expect("load"), cal);
    }

    #[test]
    fn malformed_saved_calendar_falls_back_to_defaults() {
        let conn = crate::testutil::workspace();
        db::settings_set_json(&conn, CALENDAR_KEY, &json!({ "term2StartMonth": 1 }))
            .expect("save out-of-order");
        assert_eq!(CalendarSettings::load(&conn).expect("load"), CalendarSettings::default());

        db::settings_set_json(&conn, CALENDAR_KEY, &json!([3, 7, 11])).expect("save array");
        assert_eq!(CalendarSettings::load(&conn).expect("load"), CalendarSettings::default());
    }
}
