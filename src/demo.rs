//! Seeded sample data for trying the workflow without a file

use crate::error::Result;
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Standard normal draw (Box-Muller)
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Two columns `X` and `Y` of standard normal noise
pub fn random_frame(rows: usize, seed: u64) -> Result<DataFrame> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let x: Vec<f64> = (0..rows).map(|_| standard_normal(&mut rng)).collect();
    let y: Vec<f64> = (0..rows).map(|_| standard_normal(&mut rng)).collect();

    Ok(DataFrame::new(vec![
        Column::new("X".into(), x),
        Column::new("Y".into(), y),
    ])?)
}

/// Features `A`, `B` and a binary `target` that is 1 when `A + B > 0`
pub fn classification_frame(rows: usize, seed: u64) -> Result<DataFrame> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut a = Vec::with_capacity(rows);
    let mut b = Vec::with_capacity(rows);
    let mut target = Vec::with_capacity(rows);

    for _ in 0..rows {
        let ai = standard_normal(&mut rng);
        let bi = standard_normal(&mut rng);
        target.push(if ai + bi > 0.0 { 1i64 } else { 0 });
        a.push(ai);
        b.push(bi);
    }

    Ok(DataFrame::new(vec![
        Column::new("A".into(), a),
        Column::new("B".into(), b),
        Column::new("target".into(), target),
    ])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_frame_shape() {
        let df = random_frame(10, 1).unwrap();
        assert_eq!(df.shape(), (10, 2));
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["X", "Y"]);
    }

    #[test]
    fn test_random_frame_seeded() {
        assert!(random_frame(10, 5).unwrap().equals(&random_frame(10, 5).unwrap()));
        assert!(!random_frame(10, 5).unwrap().equals(&random_frame(10, 6).unwrap()));
    }

    #[test]
    fn test_normal_moments() {
        let df = random_frame(5000, 3).unwrap();
        let x = df.column("X").unwrap().f64().unwrap();
        assert!(x.mean().unwrap().abs() < 0.1);
        assert!((x.std(1).unwrap() - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_classification_frame_labels() {
        let df = classification_frame(100, 42).unwrap();
        assert_eq!(df.shape(), (100, 3));

        let a = df.column("A").unwrap().f64().unwrap();
        let b = df.column("B").unwrap().f64().unwrap();
        let t = df.column("target").unwrap().i64().unwrap();
        for i in 0..100 {
            let expected = if a.get(i).unwrap() + b.get(i).unwrap() > 0.0 { 1 } else { 0 };
            assert_eq!(t.get(i), Some(expected));
        }
    }
}
