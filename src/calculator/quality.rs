// ==========================================
// Quality: good parts / total parts produced
// ==========================================

use crate::domain::metrics::{CalcWindow, QualityResult};

/// Calculate quality rate.
///
/// good_parts = max(total - reject, 0): negative reject counts or
/// rejects exceeding the total are tolerated by flooring at zero.
/// Zero total parts yields 0.
pub fn calculate_quality(
    machine_id: i64,
    shift_id: &str,
    window: CalcWindow,
    total_parts: i64,
    reject_parts: i64,
) -> QualityResult {
    let good_parts = (total_parts - reject_parts).max(0);
    let value = if total_parts > 0 {
        (good_parts as f64 / total_parts as f64).min(1.0)
    } else {
        0.0
    };

    QualityResult {
        machine_id,
        shift_id: shift_id.to_string(),
        window,
        total_parts,
        good_parts,
        reject_parts,
        value,
    }
}
