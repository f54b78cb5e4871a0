//! Adaptive PMV comfort model.
//!
//! `pmv` is the ISO 7730 heat-balance computation (Fanger), and
//! `adaptive_pmv` applies the adaptive coefficient on top of it. Both are
//! pure functions returning `Option`: inputs outside the standard's
//! applicability window, or a failed clothing-surface-temperature solve,
//! yield `None` rather than an error. Callers treat `None` as the
//! worst-case classification.

use airlogic_core::config::defaults;

/// ISO 7730 applicability window. Outside it the model is undefined.
fn within_applicability(tdb: f64, tr: f64, vr: f64, met: f64, clo: f64) -> bool {
    (10.0..=30.0).contains(&tdb)
        && (10.0..=40.0).contains(&tr)
        && (0.0..=1.0).contains(&vr)
        && (0.8..=4.0).contains(&met)
        && (0.0..=2.0).contains(&clo)
}

/// Predicted Mean Vote per ISO 7730.
///
/// * `tdb` - dry bulb air temperature (deg C)
/// * `tr`  - mean radiant temperature (deg C)
/// * `vr`  - relative air velocity (m/s)
/// * `rh`  - relative humidity (%)
/// * `met` - metabolic rate (met)
/// * `clo` - clothing insulation (clo)
/// * `wme` - external work (met), normally 0
pub fn pmv(tdb: f64, tr: f64, vr: f64, rh: f64, met: f64, clo: f64, wme: f64) -> Option<f64> {
    if !within_applicability(tdb, tr, vr, met, clo) {
        return None;
    }

    // Water vapour pressure (Pa)
    let pa = rh * 10.0 * (16.6536 - 4030.183 / (tdb + 235.0)).exp();

    let icl = 0.155 * clo; // thermal insulation of clothing (m2K/W)
    let m = met * 58.15; // metabolic rate (W/m2)
    let w = wme * 58.15; // external work (W/m2)
    let mw = m - w;

    // Clothing area factor
    let fcl = if icl <= 0.078 {
        1.0 + 1.29 * icl
    } else {
        1.05 + 0.645 * icl
    };

    // Forced convection coefficient
    let hcf = 12.1 * vr.sqrt();
    let taa = tdb + 273.0;
    let tra = tr + 273.0;

    // Iterative solve for clothing surface temperature
    let t_cla = taa + (35.5 - tdb) / (3.5 * icl + 0.1);
    let p1 = icl * fcl;
    let p2 = p1 * 3.96;
    let p3 = p1 * 100.0;
    let p4 = p1 * taa;
    let p5 = 308.7 - 0.028 * mw + p2 * (tra / 100.0).powi(4);

    let mut xn = t_cla / 100.0;
    let mut xf = t_cla / 50.0;
    let eps = 0.00015;
    let mut hc = hcf;
    let mut iterations = 0;
    while (xn - xf).abs() > eps {
        xf = (xf + xn) / 2.0;
        let hcn = 2.38 * (100.0 * xf - taa).abs().powf(0.25);
        hc = hcf.max(hcn);
        xn = (p5 + p4 * hc - p2 * xf.powi(4)) / (100.0 + p3 * hc);
        iterations += 1;
        if iterations > 150 {
            return None;
        }
    }
    let tcl = 100.0 * xn - 273.0;

    // Heat loss components
    let hl1 = 3.05 * 0.001 * (5733.0 - 6.99 * mw - pa); // skin diffusion
    let hl2 = if mw > 58.15 { 0.42 * (mw - 58.15) } else { 0.0 }; // sweating
    let hl3 = 1.7 * 0.00001 * m * (5867.0 - pa); // latent respiration
    let hl4 = 0.0014 * m * (34.0 - tdb); // dry respiration
    let hl5 = 3.96 * fcl * (xn.powi(4) - (tra / 100.0).powi(4)); // radiation
    let hl6 = fcl * hc * (tcl - tdb); // convection

    let ts = 0.303 * (-0.036 * m).exp() + 0.028;
    let value = ts * (mw - hl1 - hl2 - hl3 - hl4 - hl5 - hl6);
    value.is_finite().then_some(value)
}

/// Adaptive PMV: `pmv / (1 + a * pmv)`.
///
/// Undefined when the underlying PMV is undefined or the denominator
/// degenerates.
pub fn adaptive_pmv(
    tdb: f64,
    tr: f64,
    vr: f64,
    rh: f64,
    met: f64,
    clo: f64,
    adaptive_coefficient: f64,
) -> Option<f64> {
    let base = pmv(tdb, tr, vr, rh, met, clo, 0.0)?;
    let denominator = 1.0 + adaptive_coefficient * base;
    if denominator.abs() < 1e-9 {
        return None;
    }
    let value = base / denominator;
    value.is_finite().then_some(value)
}

/// Invert the comfort target to an integer setpoint temperature.
///
/// Scans candidate setpoints 18..=30 ascending and returns the first whose
/// adaptive PMV reaches `target_pmv`. When `mrt` is unset each candidate
/// doubles as its own radiant temperature (operative approximation).
/// `prefer_lower` returns the previous candidate instead (clamped to 18),
/// the "round down to stay cooler" tie-break used for pre-cooling. An
/// exhausted scan returns the documented fallback of 25.
///
/// The exhaustive scan is deliberate: the model is not guaranteed monotonic
/// or invertible across the whole domain, so first-match over the discrete
/// range is the reproducible policy.
#[allow(clippy::too_many_arguments)]
pub fn find_target_temperature(
    target_pmv: f64,
    rh: f64,
    mrt: Option<f64>,
    vr: f64,
    met: f64,
    clo: f64,
    adaptive_coefficient: f64,
    prefer_lower: bool,
) -> i32 {
    for candidate in defaults::SETPOINT_SCAN_MIN..=defaults::SETPOINT_SCAN_MAX {
        let tdb = candidate as f64;
        let tr = mrt.unwrap_or(tdb);
        let Some(apmv) = adaptive_pmv(tdb, tr, vr, rh, met, clo, adaptive_coefficient) else {
            continue;
        };
        if apmv >= target_pmv {
            if prefer_lower {
                return (candidate - 1).max(defaults::SETPOINT_SCAN_MIN);
            }
            return candidate;
        }
    }
    defaults::FALLBACK_SETPOINT
}
