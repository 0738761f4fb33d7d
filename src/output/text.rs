use super::{Delta, Formatter, paths};
use crate::units::ms_to_kn;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn number(delta: &Delta, path: &str) -> f64 {
    delta.value(path).map_or(f64::NAN, |v| v.as_f64())
}

impl Formatter for TextFormatter {
    fn format(&self, delta: &Delta) -> String {
        let summary = format!(
            "HDG {:>5.1}° STW {:>5.2} kn AWS {:>5.2} kn AWA {:>6.1}° TWS {:>5.2} kn TWA {:>6.1}°",
            number(delta, paths::HEADING).to_degrees(),
            ms_to_kn(number(delta, paths::WATER_SPEED)),
            ms_to_kn(number(delta, paths::APPARENT_WIND_SPEED)),
            number(delta, paths::APPARENT_WIND_ANGLE).to_degrees(),
            ms_to_kn(number(delta, paths::TRUE_WIND_SPEED)),
            number(delta, paths::TRUE_WIND_ANGLE).to_degrees(),
        );
        if self.verbose {
            format!(
                "{} [roll {:.1}°, pitch {:.1}°, leeway {:.1}°, log {:.0} m, pulses {}/{}]",
                summary,
                number(delta, paths::ROLL).to_degrees(),
                number(delta, paths::PITCH).to_degrees(),
                number(delta, paths::LEEWAY).to_degrees(),
                number(delta, paths::LOG),
                number(delta, paths::WIND_PULSES),
                number(delta, paths::WATER_PULSES),
            )
        } else {
            summary
        }
    }
}
