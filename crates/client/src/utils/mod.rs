// Helper utilities - time, randomness, math
//
// Time and randomness are routed through here so the simulation modules
// (world, camera, effects, scanner) never touch web-sys directly and can be
// unit-tested on the host.

/// Linear interpolation between two values
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Current high-precision timestamp in milliseconds.
#[cfg(target_arch = "wasm32")]
pub fn now() -> f64 {
    web_sys::window()
        .expect("no global window")
        .performance()
        .expect("no performance")
        .now()
}

/// Milliseconds since the process started (host builds).
#[cfg(not(target_arch = "wasm32"))]
pub fn now() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;
    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Uniform random in [0, 1).
#[cfg(target_arch = "wasm32")]
pub fn random() -> f32 {
    js_sys::Math::random() as f32
}

#[cfg(not(target_arch = "wasm32"))]
pub fn random() -> f32 {
    rand::random::<f32>()
}

/// Uniform random in [-1, 1).
pub fn random_signed() -> f32 {
    random() * 2.0 - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp(2.0, 10.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(2.0, 10.0, 0.5), 6.0);
    }

    #[test]
    fn random_stays_in_range() {
        for _ in 0..1000 {
            let r = random();
            assert!((0.0..1.0).contains(&r));
        }
    }
}
