use super::{Delta, Formatter, paths};

/// One row per delta, columns in publication order
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, delta: &Delta) -> String {
        let mut row = delta.timestamp().to_string();
        for path in paths::ALL {
            row.push(',');
            if let Some(value) = delta.value(path) {
                row.push_str(&value.to_string());
            }
        }
        row
    }

    fn header(&self) -> Option<&'static str> {
        Some(
            "ts,sensors.timestamp,sensors.wind.pulses,sensors.water.pulses,sensors.wind.sinV,sensors.wind.cosV,navigation.headingMagnetic,navigation.rateOfTurn,navigation.attitude.roll,navigation.attitude.pitch,navigation.attitude.yaw,environment.wind.speedApparent,environment.wind.angleApparent,environment.wind.speedTrue,environment.wind.angleTrueWater,navigation.leewayAngle,navigation.speedThroughWater,navigation.log",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{PathValue, Value};
    use chrono::Utc;

    #[test]
    fn test_header_matches_paths() {
        let header = CsvFormatter.header().unwrap();
        let columns: Vec<&str> = header.split(',').skip(1).collect();
        assert_eq!(columns, paths::ALL.to_vec());
    }

    #[test]
    fn test_missing_values_leave_empty_cells() {
        let delta = Delta::new(
            "vessels.self".into(),
            Utc::now(),
            vec![PathValue {
                path: paths::LOG,
                value: Value::Number(1852.0),
            }],
        );
        let row = CsvFormatter.format(&delta);
        assert_eq!(row.split(',').count(), paths::ALL.len() + 1);
        assert!(row.ends_with(",1852"));
    }
}
