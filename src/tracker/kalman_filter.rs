//! Constant-velocity Kalman filter over the `[x, y, w, h, vx, vy, vw, vh]` state.
//!
//! All matrices are fixed-size nalgebra types, so predict/update never allocate.

use nalgebra::{Matrix4, SMatrix, SVector, Vector4};

use crate::tracker::error::KalmanError;

/// 8-dimensional state mean.
pub type StateMean = SVector<f64, 8>;
/// 8x8 state covariance.
pub type StateCovariance = SMatrix<f64, 8, 8>;
/// Measurement in xywh (center x, center y, width, height).
pub type Measurement = Vector4<f64>;

type ObservationMatrix = SMatrix<f64, 4, 8>;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: StateCovariance,
    update_mat: ObservationMatrix,
    std_weight_position: f64,
    std_weight_velocity: f64,
    init_velocity_var: f64,
    std_width: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let ndim = 4;
        let mut motion_mat = StateCovariance::identity();
        for i in 0..ndim {
            motion_mat[(i, ndim + i)] = 1.0;
        }

        Self {
            motion_mat,
            update_mat: ObservationMatrix::identity(),
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 2.0,
            init_velocity_var: 1e-2,
            std_width: 1e-1,
        }
    }

    /// Create a track state from an unassociated measurement.
    ///
    /// Position and size uncertainty scale with the measured height; velocities
    /// start at zero with a small fixed variance.
    pub fn initiate(&self, measurement: [f64; 4]) -> (StateMean, StateCovariance) {
        let mut mean = StateMean::zeros();
        mean.fixed_rows_mut::<4>(0).copy_from(&Measurement::from(measurement));

        let std_pos = 2.0 * self.std_weight_position * measurement[3];
        let pos_var = std_pos * std_pos;
        let covariance = StateCovariance::from_diagonal(&StateMean::from([
            pos_var,
            pos_var,
            pos_var,
            pos_var,
            self.init_velocity_var,
            self.init_velocity_var,
            self.init_velocity_var,
            self.init_velocity_var,
        ]));

        (mean, covariance)
    }

    /// Advance the state by one frame.
    pub fn predict(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (StateMean, StateCovariance) {
        let h = mean[3];
        let std_pos = self.std_weight_position * h;
        let std_vel = self.std_weight_velocity * h;
        let (pos_var, vel_var) = (std_pos * std_pos, std_vel * std_vel);
        let motion_cov = StateCovariance::from_diagonal(&StateMean::from([
            pos_var, pos_var, pos_var, pos_var, vel_var, vel_var, vel_var, vel_var,
        ]));

        let new_mean = self.motion_mat * mean;
        let new_covariance =
            self.motion_mat * covariance * self.motion_mat.transpose() + motion_cov;

        (new_mean, new_covariance)
    }

    /// Project the state into measurement space, returning `(H·mean, H·P·Hᵀ + R)`.
    ///
    /// Width noise is a fixed constant instead of scaling with height.
    pub fn project(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
    ) -> (Measurement, Matrix4<f64>) {
        let std_pos = self.std_weight_position * mean[3];
        let pos_var = std_pos * std_pos;
        let innovation_cov = Matrix4::from_diagonal(&Measurement::new(
            pos_var,
            pos_var,
            self.std_width * self.std_width,
            pos_var,
        ));

        let mean_proj = self.update_mat * mean;
        let covariance_proj =
            self.update_mat * covariance * self.update_mat.transpose() + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Fuse a measurement into the state.
    pub fn update(
        &self,
        mean: &StateMean,
        covariance: &StateCovariance,
        measurement: [f64; 4],
    ) -> Result<(StateMean, StateCovariance), KalmanError> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let s_inv = invert_4x4(&projected_cov)?;

        // K = P * H^T * S^-1
        let kalman_gain = covariance * self.update_mat.transpose() * s_inv;
        let innovation = Measurement::from(measurement) - projected_mean;

        let new_mean = mean + kalman_gain * innovation;
        let new_covariance = covariance - kalman_gain * (self.update_mat * covariance);

        Ok((new_mean, new_covariance))
    }
}

/// Invert the innovation covariance, rejecting singular or NaN-poisoned input.
fn invert_4x4(m: &Matrix4<f64>) -> Result<Matrix4<f64>, KalmanError> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(KalmanError::SingularInnovation);
    }
    m.try_inverse()
        .filter(|inv| inv.iter().all(|v| v.is_finite()))
        .ok_or(KalmanError::SingularInnovation)
}
