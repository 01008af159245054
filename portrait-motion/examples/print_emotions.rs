//! Print the motion parameters of every emotion at a few intensities
//!
//! Usage: cargo run -p portrait-motion --example print_emotions [intensity]

use portrait_motion::{resolve, Emotion};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let intensities: Vec<f64> = match std::env::args().nth(1) {
        Some(arg) => vec![arg.parse()?],
        None => vec![0.0, 0.5, 1.0],
    };

    println!(
        "{:<10} {:>5} {:>7} {:>7} {:>7} {:>6} {:>6} {:>6} {:>6}",
        "emotion", "int", "rot_x", "rot_y", "rot_z", "scale", "mouth", "eye", "brow"
    );

    for emotion in Emotion::ALL {
        for &intensity in &intensities {
            let p = resolve(emotion, intensity)?;
            println!(
                "{:<10} {:>5.2} {:>7.3} {:>7.3} {:>7.3} {:>6.3} {:>6.3} {:>6.3} {:>6.3}",
                emotion.as_str(),
                intensity,
                p.rotation_x,
                p.rotation_y,
                p.rotation_z,
                p.expression_scale,
                p.mouth_open,
                p.eye_open,
                p.eyebrow_raise
            );
        }
    }

    Ok(())
}
