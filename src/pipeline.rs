use crate::recover::{recover_json, MalformedPayload};
use crate::schedule::{normalize_payload, Timetable};
use crate::variety::{enhance, validate, VarietyConfig};

pub struct PipelineOutcome {
    pub timetable: Timetable,
    pub issues: Vec<String>,
    pub enhanced: bool,
}

/// The full normalization pass over one raw model response: recover a JSON
/// object, normalize it onto the canonical grid, validate variety, and try
/// the enhancer once when validation fails. If the enhanced grid still does
/// not validate, the original grid is returned together with the original
/// issue list; saving a degenerate result stays the user's call.
pub fn run(raw: &str, cfg: &VarietyConfig) -> Result<PipelineOutcome, MalformedPayload> {
    let value = recover_json(raw)?;
    let timetable = normalize_payload(&value);
    let report = validate(&timetable, cfg);
    if report.valid {
        return Ok(PipelineOutcome {
            timetable,
            issues: Vec::new(),
            enhanced: false,
        });
    }

    let enhanced = enhance(&timetable);
    if validate(&enhanced, cfg).valid {
        log::info!("variety enhancer repaired a degenerate generation");
        return Ok(PipelineOutcome {
            timetable: enhanced,
            issues: Vec::new(),
            enhanced: true,
        });
    }

    Ok(PipelineOutcome {
        timetable,
        issues: report.issues,
        enhanced: false,
    })
}
