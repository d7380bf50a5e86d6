//! Lumped electrochemistry model of a Li-ion 18650 cell.
//!
//! States are the cell temperature, three voltage drops (ohmic, negative and
//! positive surface overpotentials) and the charge held in the bulk and
//! surface volumes of each electrode. The single input is electrical power
//! draw. End of discharge (EOD) is reached when terminal voltage falls below
//! `v_eod`.

use pf_config::ConfigMap;
use pf_core::{
    InputVector, OutputVector, PfError, PfResult, PredictedOutputVector, StateVector, clamp_unit,
    ensure_finite,
};

use crate::prognostics::PrognosticsModel;
use crate::shape::{ModelShape, PrognosticsShape};
use crate::system::SystemModel;

/// State indices.
pub mod state {
    pub const TB: usize = 0;
    pub const VO: usize = 1;
    pub const VSN: usize = 2;
    pub const VSP: usize = 3;
    pub const QNB: usize = 4;
    pub const QNS: usize = 5;
    pub const QPB: usize = 6;
    pub const QPS: usize = 7;
}

/// Input indices.
pub mod input {
    pub const POWER: usize = 0;
}

/// Output indices.
pub mod output {
    pub const TEMPERATURE: usize = 0;
    pub const VOLTAGE: usize = 1;
}

pub const STATE_NAMES: [&str; 8] = ["tb", "Vo", "Vsn", "Vsp", "qnB", "qnS", "qpB", "qpS"];

pub const DEFAULT_Q_MOBILE: f64 = 7600.0;
pub const DEFAULT_VOLUME: f64 = 2e-5;
pub const DEFAULT_V_EOD: f64 = 3.0;

const KELVIN_OFFSET: f64 = 273.15;

/// Model parameters. Derived charge limits are computed from `q_mobile` and
/// `vol` by [`BatteryParameters::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryParameters {
    pub q_mobile: f64,
    pub xn_max: f64,
    pub xn_min: f64,
    pub xp_max: f64,
    pub xp_min: f64,
    pub q_max: f64,
    /// Ohmic resistance (Ohm)
    pub ro: f64,
    /// Universal gas constant (J/K/mol)
    pub r: f64,
    /// Faraday's constant (C/mol)
    pub f: f64,
    pub alpha: f64,
    /// Electrode surface areas
    pub sn: f64,
    pub sp: f64,
    /// Butler-Volmer rate constants
    pub kn: f64,
    pub kp: f64,
    pub vol: f64,
    pub vol_s_fraction: f64,
    pub vol_s: f64,
    pub vol_b: f64,
    pub qp_min: f64,
    pub qp_max: f64,
    pub qp_s_min: f64,
    pub qp_b_min: f64,
    pub qn_min: f64,
    pub qn_max: f64,
    pub qn_s_max: f64,
    pub qn_b_max: f64,
    pub q_s_max: f64,
    pub q_b_max: f64,
    /// Diffusion time constant (s)
    pub t_diffusion: f64,
    /// Ohmic drop time constant (s)
    pub to: f64,
    /// Surface overpotential time constants (s)
    pub tsn: f64,
    pub tsp: f64,
    pub u0p: f64,
    /// Redlich-Kister coefficients, positive electrode
    pub ap: [f64; 13],
    pub u0n: f64,
    /// Redlich-Kister coefficients, negative electrode
    pub an: [f64; 13],
    pub v_eod: f64,
    /// Initial temperature (K)
    pub tb0: f64,
}

impl BatteryParameters {
    /// Parameters of the reference 18650 cell.
    pub fn standard() -> PfResult<Self> {
        Self::new(DEFAULT_Q_MOBILE, DEFAULT_VOLUME)
    }

    pub fn new(q_mobile: f64, vol: f64) -> PfResult<Self> {
        ensure_finite(q_mobile, "qMobile")?;
        ensure_finite(vol, "Vol")?;
        if !(q_mobile > 0.0) {
            return Err(PfError::Construction {
                what: format!("qMobile must be positive, got {q_mobile}"),
            });
        }
        if !(vol > 0.0) {
            return Err(PfError::Construction {
                what: format!("Vol must be positive, got {vol}"),
            });
        }

        let xn_max = 0.6;
        let xn_min = 0.0;
        let xp_max = 1.0;
        let xp_min = 0.4;
        let q_max = q_mobile / (xn_max - xn_min);
        let vol_s_fraction = 0.1;
        let vol_s = vol_s_fraction * vol;
        let vol_b = vol - vol_s;

        let qp_min = q_max * xp_min;
        let qp_max = q_max * xp_max;
        let qn_min = q_max * xn_min;
        let qn_max = q_max * xn_max;

        Ok(Self {
            q_mobile,
            xn_max,
            xn_min,
            xp_max,
            xp_min,
            q_max,
            ro: 0.117215,
            r: 8.3144621,
            f: 96487.0,
            alpha: 0.5,
            sn: 0.000437545,
            sp: 0.00030962,
            kn: 2120.96,
            kp: 248898.0,
            vol,
            vol_s_fraction,
            vol_s,
            vol_b,
            qp_min,
            qp_max,
            qp_s_min: qp_min * vol_s / vol,
            qp_b_min: qp_min * vol_b / vol,
            qn_min,
            qn_max,
            qn_s_max: qn_max * vol_s / vol,
            qn_b_max: qn_max * vol_b / vol,
            q_s_max: q_max * vol_s / vol,
            q_b_max: q_max * vol_b / vol,
            t_diffusion: 7e6,
            to: 6.08671,
            tsn: 1001.38,
            tsp: 46.4311,
            u0p: 4.03,
            ap: [
                -31593.7, 0.106747, 24606.4, -78561.9, 13317.9, 307387.0, 84916.1, -1.07469e6,
                2285.04, 990894.0, 283920.0, -161513.0, -469218.0,
            ],
            u0n: 0.01,
            an: [86.19, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            v_eod: DEFAULT_V_EOD,
            tb0: 292.1,
        })
    }
}

/// Redlich-Kister expansion of the excess potential.
fn redlich_kister(coeffs: &[f64], x: f64, faraday: f64) -> f64 {
    let s = 2.0 * x - 1.0;
    coeffs
        .iter()
        .enumerate()
        .map(|(k, a)| {
            let mut term = s.powi(k as i32 + 1);
            if k > 0 {
                term -= 2.0 * x * k as f64 * (1.0 - x) * s.powi(k as i32 - 1);
            }
            a * term / faraday
        })
        .sum()
}

#[derive(Debug, Clone)]
pub struct Battery {
    shape: PrognosticsShape,
    params: BatteryParameters,
}

impl Battery {
    pub fn new(params: BatteryParameters) -> PfResult<Self> {
        let shape = PrognosticsShape::new(
            STATE_NAMES.len(),
            ["power"],
            ["temperature", "voltage"],
            ["SOC"],
        )?
        .with_input_parameter_count(0)
        .with_events(["EOD"])?;
        Ok(Self { shape, params })
    }

    /// Build from configuration (`Model.qMobile`, `Model.Vol`, `Model.VEOD`).
    pub fn from_config(config: &ConfigMap) -> PfResult<Self> {
        let q_mobile = config.f64_or("Model.qMobile", DEFAULT_Q_MOBILE)?;
        let vol = config.f64_or("Model.Vol", DEFAULT_VOLUME)?;
        let mut params = BatteryParameters::new(q_mobile, vol)?;
        params.v_eod = ensure_finite(config.f64_or("Model.VEOD", DEFAULT_V_EOD)?, "VEOD")?;
        tracing::debug!(q_mobile, vol, v_eod = params.v_eod, "configured battery model");
        Self::new(params)
    }

    /// Battery with [`BatteryParameters::standard`].
    pub fn standard() -> PfResult<Self> {
        Self::new(BatteryParameters::standard()?)
    }

    pub fn parameters(&self) -> &BatteryParameters {
        &self.params
    }

    /// Terminal voltage at state `x`.
    pub fn voltage(&self, x: &StateVector) -> PfResult<f64> {
        x.ensure_len(self.state_size())?;
        let p = &self.params;
        let tb = x[state::TB];
        let xn_s = x[state::QNS] / p.q_s_max;
        let xp_s = x[state::QPS] / p.q_s_max;

        let ven = p.u0n
            + p.r * tb / p.f * ((1.0 - xn_s) / xn_s).ln()
            + redlich_kister(&p.an, xn_s, p.f);
        let vep = p.u0p
            + p.r * tb / p.f * ((1.0 - xp_s) / xp_s).ln()
            + redlich_kister(&p.ap, xp_s, p.f);

        Ok(vep - ven - x[state::VO] - x[state::VSN] - x[state::VSP])
    }

    fn charge_fraction(&self, x: &[f64]) -> PfResult<f64> {
        PfError::check_len("state", self.state_size(), x.len())?;
        Ok(clamp_unit((x[state::QNS] + x[state::QNB]) / self.params.qn_max))
    }

    /// Full-charge state at the given temperature (K).
    pub fn full_charge_state(&self, tb: f64) -> StateVector {
        let p = &self.params;
        let mut x = StateVector::zeros(STATE_NAMES.len());
        x[state::TB] = tb;
        x[state::QNB] = p.qn_b_max;
        x[state::QNS] = p.qn_s_max;
        x[state::QPB] = p.qp_b_min;
        x[state::QPS] = p.qp_s_min;
        x
    }
}

impl SystemModel for Battery {
    fn shape(&self) -> &ModelShape {
        self.shape.base()
    }

    fn state_eqn(
        &self,
        _t: f64,
        x: &StateVector,
        u: &InputVector,
        dt: f64,
    ) -> PfResult<StateVector> {
        x.ensure_len(self.state_size())?;
        u.ensure_len(self.input_names().len())?;
        let p = &self.params;

        let tb = x[state::TB];
        let current = u[input::POWER] / self.voltage(x)?;

        // Diffusion between bulk and surface volumes
        let cn_bulk = x[state::QNB] / p.vol_b;
        let cn_surface = x[state::QNS] / p.vol_s;
        let cp_bulk = x[state::QPB] / p.vol_b;
        let cp_surface = x[state::QPS] / p.vol_s;
        let qdot_bsn = (cn_bulk - cn_surface) / p.t_diffusion;
        let qdot_bsp = (cp_bulk - cp_surface) / p.t_diffusion;

        // Butler-Volmer surface overpotentials
        let xn_s = x[state::QNS] / p.q_s_max;
        let xp_s = x[state::QPS] / p.q_s_max;
        let jn0 = p.kn * (1.0 - xn_s).powf(p.alpha) * xn_s.powf(p.alpha);
        let jp0 = p.kp * (1.0 - xp_s).powf(p.alpha) * xp_s.powf(p.alpha);
        let jn = current / p.sn;
        let jp = current / p.sp;
        let vsn_nominal = p.r * tb / p.f / p.alpha * (jn / (2.0 * jn0)).asinh();
        let vsp_nominal = p.r * tb / p.f / p.alpha * (jp / (2.0 * jp0)).asinh();
        let vo_nominal = current * p.ro;

        let mut xdot = [0.0; STATE_NAMES.len()];
        xdot[state::TB] = 0.0;
        xdot[state::VO] = (vo_nominal - x[state::VO]) / p.to;
        xdot[state::VSN] = (vsn_nominal - x[state::VSN]) / p.tsn;
        xdot[state::VSP] = (vsp_nominal - x[state::VSP]) / p.tsp;
        xdot[state::QNB] = -qdot_bsn;
        xdot[state::QNS] = qdot_bsn - current;
        xdot[state::QPB] = -qdot_bsp;
        xdot[state::QPS] = qdot_bsp + current;

        let mut next = x.clone();
        for (xi, di) in next.as_mut_slice().iter_mut().zip(xdot) {
            *xi += dt * di;
        }
        Ok(next)
    }

    fn output_eqn(&self, _t: f64, x: &StateVector, u: &InputVector) -> PfResult<OutputVector> {
        x.ensure_len(self.state_size())?;
        u.ensure_len(self.input_names().len())?;
        let mut z = self.output_vector();
        z[output::TEMPERATURE] = x[state::TB] - KELVIN_OFFSET;
        z[output::VOLTAGE] = self.voltage(x)?;
        Ok(z)
    }

    fn initialize(&self, u: &InputVector, z: &OutputVector) -> PfResult<StateVector> {
        u.ensure_len(self.input_names().len())?;
        z.ensure_len(self.output_names().len())?;
        let measured = z[output::TEMPERATURE] + KELVIN_OFFSET;
        let tb = if measured.is_finite() && measured > 0.0 {
            measured
        } else {
            self.params.tb0
        };
        Ok(self.full_charge_state(tb))
    }
}

impl PrognosticsModel for Battery {
    fn prognostics_shape(&self) -> &PrognosticsShape {
        &self.shape
    }

    fn threshold(&self, _t: f64, x: &StateVector, _u: &InputVector) -> PfResult<bool> {
        let v = self.voltage(x)?;
        Ok(!v.is_finite() || v < self.params.v_eod)
    }

    fn event_state(&self, x: &[f64]) -> PfResult<Vec<f64>> {
        Ok(vec![self.charge_fraction(x)?])
    }

    /// The input vector is the load estimate itself (power in W).
    fn derive_input(
        &self,
        _t: f64,
        params: &[f64],
        load_estimate: &[f64],
    ) -> PfResult<InputVector> {
        PfError::check_len("input parameters", 0, params.len())?;
        PfError::check_len("load estimate", self.input_names().len(), load_estimate.len())?;
        Ok(InputVector::from_vec(load_estimate.to_vec()))
    }

    fn predicted_output(
        &self,
        _t: f64,
        x: &StateVector,
        _u: &InputVector,
        _z: &OutputVector,
    ) -> PfResult<PredictedOutputVector> {
        let mut p = self.predicted_output_vector();
        p[0] = self.charge_fraction(x.as_slice())?;
        Ok(p)
    }
}
