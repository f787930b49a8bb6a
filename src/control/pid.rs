//! PID core for the kettle heater.
//!
//! Derivative acts on the measurement rather than the error so a setpoint
//! jump (new mash rest, boil start) does not kick the output. Integral is
//! conditionally frozen while the output saturates against the active
//! power cap.

pub struct Pid {
    kp: f32,
    ki: f32,
    kd: f32,
    setpoint: f32,
    integral: f32,
    prev_measurement: Option<f32>,
    output_min: f32,
    output_max: f32,
}

impl Pid {
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            setpoint: 0.0,
            integral: 0.0,
            prev_measurement: None,
            output_min: 0.0,
            output_max: 100.0,
        }
    }

    /// Replace the gains. Resets accumulated state — tunings are pushed at
    /// stage starts, where a clean transient is preferable to carrying an
    /// integrator wound up under the old gains.
    pub fn set_tunings(&mut self, kp: f32, ki: f32, kd: f32) {
        self.kp = kp;
        self.ki = ki;
        self.kd = kd;
        self.reset();
    }

    /// Clamp range for the output (the active power cap).
    pub fn set_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max.max(min);
        self.integral = self.integral.clamp(self.output_min, self.output_max);
    }

    pub fn set_target(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
    }

    pub fn target(&self) -> f32 {
        self.setpoint
    }

    /// One PID step. `dt` is the sample period in seconds.
    pub fn compute(&mut self, measurement: f32, dt: f32) -> f32 {
        let error = self.setpoint - measurement;

        let p = self.kp * error;

        self.integral += self.ki * error * dt;
        self.integral = self.integral.clamp(self.output_min, self.output_max);

        let d = match (self.prev_measurement, dt > 0.0) {
            (Some(prev), true) => -self.kd * (measurement - prev) / dt,
            _ => 0.0,
        };
        self.prev_measurement = Some(measurement);

        let unclamped = p + self.integral + d;
        let output = unclamped.clamp(self.output_min, self.output_max);

        // Freeze the integrator while saturated in the direction of error.
        if (unclamped > self.output_max && error > 0.0)
            || (unclamped < self.output_min && error < 0.0)
        {
            self.integral -= self.ki * error * dt;
            self.integral = self.integral.clamp(self.output_min, self.output_max);
        }

        output
    }

    /// Drop accumulated state (integrator, derivative history).
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_measurement = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drives_up_when_below_target() {
        let mut pid = Pid::new(10.0, 0.0, 0.0);
        pid.set_target(66.0);
        let out = pid.compute(60.0, 5.0);
        assert!(out > 0.0);
    }

    #[test]
    fn output_respects_limits() {
        let mut pid = Pid::new(100.0, 0.0, 0.0);
        pid.set_target(100.0);
        pid.set_limits(0.0, 80.0);
        let out = pid.compute(20.0, 5.0);
        assert!((out - 80.0).abs() < 1e-6, "must clamp to the power cap");
        let out = pid.compute(150.0, 5.0);
        assert!(out.abs() < 1e-6, "must clamp at zero when over target");
    }

    #[test]
    fn integral_does_not_wind_up_past_cap() {
        let mut pid = Pid::new(0.0, 5.0, 0.0);
        pid.set_target(100.0);
        pid.set_limits(0.0, 100.0);
        for _ in 0..1000 {
            let _ = pid.compute(20.0, 5.0);
        }
        // Once the measurement crosses the setpoint the output must fall
        // within a few samples instead of bleeding off a huge integrator.
        let mut out = 100.0;
        for _ in 0..5 {
            out = pid.compute(110.0, 5.0);
        }
        assert!(out < 100.0);
    }

    #[test]
    fn setpoint_step_does_not_kick_derivative() {
        let mut pid = Pid::new(0.0, 0.0, 50.0);
        pid.set_target(60.0);
        let _ = pid.compute(60.0, 5.0);
        // Setpoint jumps; measurement unchanged → derivative term stays 0.
        pid.set_target(100.0);
        let out = pid.compute(60.0, 5.0);
        assert!(out.abs() < 1e-6);
    }

    #[test]
    fn set_tunings_resets_state() {
        let mut pid = Pid::new(0.0, 10.0, 0.0);
        pid.set_target(100.0);
        for _ in 0..10 {
            let _ = pid.compute(0.0, 5.0);
        }
        pid.set_tunings(1.0, 0.0, 0.0);
        let out = pid.compute(100.0, 5.0);
        assert!(out.abs() < 1e-6, "integrator must be cleared");
    }
}
