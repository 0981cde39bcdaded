use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::heart_rate::{HrSample, HrTrace};
use crate::ingest::{COL_TOUCHES, ConstantTable, Position, SessionBundle, TrackingRow, VideoRow};
use crate::metrics::MetricId;
use crate::pitch::{PITCH_LENGTH_M, PITCH_WIDTH_M};
use crate::positions::RawField;

const PLAYERS: [(&str, Position); 6] = [
    ("Lina Moreau", Position::AT),
    ("Inès Duval", Position::AIL),
    ("Camille Petit", Position::MIL),
    ("Sarah Lemoine", Position::DC),
    ("Emma Garnier", Position::DL),
    ("Julie Roux", Position::GB),
];

const SESSIONS: [&str; 5] = [
    "J1 vs Lyon",
    "J2 vs Nantes",
    "J3 vs Lille",
    "Amical vs Caen",
    "J4 vs Rennes",
];

/// Rough on-field centre of activity per position, in metres.
fn home_zone(position: Position) -> (f64, f64) {
    match position {
        Position::AT => (85.0, 34.0),
        Position::AIL => (75.0, 60.0),
        Position::MIL => (52.0, 30.0),
        Position::DC => (25.0, 34.0),
        Position::DL => (30.0, 8.0),
        Position::GB => (6.0, 34.0),
    }
}

/// Seeded synthetic workbook so the dashboard runs without data.
pub fn demo_bundle(seed: u64) -> SessionBundle {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bundle = SessionBundle::default();

    for (name, position) in PLAYERS {
        bundle.positions.insert(name.to_string(), position);
        let (zx, zy) = home_zone(position);
        for (s, session) in SESSIONS.iter().enumerate() {
            // The friendly is a half-game, below the full-match cutoff.
            let duration = if s == 3 {
                rng.gen_range(2400.0..3000.0)
            } else {
                rng.gen_range(5000.0..5700.0)
            };
            bundle.tracking.push(tracking_row(&mut rng, name, session, duration, position));

            let n = rng.gen_range(40..90);
            let mut xs = Vec::with_capacity(n);
            let mut ys = Vec::with_capacity(n);
            for _ in 0..n {
                xs.push(jitter(&mut rng, zx, 18.0).clamp(0.0, PITCH_LENGTH_M - 0.5));
                ys.push(jitter(&mut rng, zy, 14.0).clamp(0.0, PITCH_WIDTH_M - 0.5));
            }
            bundle.video.push(VideoRow {
                player: name.to_string(),
                session: session.to_string(),
                x: RawField::Text(join(&xs)),
                y: RawField::Text(join(&ys)),
                touches: Some(rng.gen_range(20.0_f64..80.0).round()),
            });
        }
    }

    bundle.constants = demo_constants();
    bundle
}

fn jitter(rng: &mut StdRng, centre: f64, spread: f64) -> f64 {
    // Sum of uniforms, close enough to a bell for a demo.
    let u: f64 = (0..3).map(|_| rng.gen_range(-1.0_f64..1.0)).sum::<f64>() / 3.0;
    centre + u * spread
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{v:.1}"))
        .collect::<Vec<_>>()
        .join(";")
}

fn tracking_row(
    rng: &mut StdRng,
    player: &str,
    session: &str,
    duration_s: f64,
    position: Position,
) -> TrackingRow {
    let minutes = duration_s / 60.0;
    let keeper = position == Position::GB;
    let per_min = if keeper {
        rng.gen_range(55.0..70.0)
    } else {
        rng.gen_range(100.0..125.0)
    };
    let distance = per_min * minutes;
    let share_16 = rng.gen_range(0.10..0.22);
    let share_20 = share_16 * rng.gen_range(0.35..0.55);
    let share_19 = share_16 * rng.gen_range(0.70..0.85);
    let share_23 = share_20 * rng.gen_range(0.30..0.50);

    let mut columns = BTreeMap::new();
    let mut put = |k: &str, v: f64| {
        columns.insert(k.to_string(), v);
    };
    put("Durée", duration_s);
    put("Distance", distance.round());
    put("Dist/min", per_min);
    put("TopSpeed", rng.gen_range(24.0..33.0));
    put("Dist>16kmh", (distance * share_16).round());
    put("Distance16", (distance * share_16).round());
    put("Dist>20kmh", distance * share_20 / 1000.0);
    put("Distance > 19km/h", (distance * share_19).round());
    put("Distance19", (distance * share_19).round());
    put("Dist>23kmh", distance * share_23 / 1000.0);
    for band in [
        "Nb Acc2>3m/s²",
        "Nb Acc3>4m/s²",
        "Nb Acc>4m/s²",
        "Nb Dec2>3m/s²",
        "Nb Dec3>4m/s²",
        "Nb Dec>4m/s²",
    ] {
        put(band, rng.gen_range(2.0_f64..40.0).round());
    }
    let high_20 = (share_20 * 100.0).round();
    let mid_16 = (share_16 * 100.0).round() - high_20;
    put("Distance20%", high_20);
    put("Distance16%", mid_16);
    let high_23 = (share_23 * 100.0).round();
    let mid_19 = (share_19 * 100.0).round() - high_23;
    put("Distance23%", high_23);
    put("Distance19%", mid_19);
    put("Distance%", 100.0 - (share_16 * 100.0).round());

    TrackingRow {
        player: player.to_string(),
        session: session.to_string(),
        duration_s: Some(duration_s),
        columns,
    }
}

fn demo_constants() -> ConstantTable {
    let mut constants = ConstantTable::default();
    let scale = |p: Position| match p {
        Position::GB => 0.55,
        Position::DC => 0.92,
        Position::MIL => 1.08,
        _ => 1.0,
    };
    let base: [(&str, f64); 8] = [
        (MetricId::Distance.label(), 10200.0),
        (MetricId::TopSpeed.label(), 29.0),
        (MetricId::DistancePerMin.label(), 112.0),
        (MetricId::Distance20.label(), 520.0),
        (MetricId::Distance23.label(), 210.0),
        (MetricId::AccDec2.label(), 95.0),
        (COL_TOUCHES, 52.0),
        ("Distance%", 86.0),
    ];
    for position in Position::ALL {
        for (indicator, value) in base {
            constants.insert(indicator, position, (value * scale(position)).round());
        }
        for (indicator, value) in [
            ("Distance20%", 5.0),
            ("Distance16%", 9.0),
            ("Distance23%", 2.0),
            ("Distance19%", 10.0),
        ] {
            constants.insert(indicator, position, value);
        }
    }
    constants
}

/// Synthetic one-hour effort with a sprint block and a cool-down.
pub fn demo_heart_rate(seed: u64) -> HrTrace {
    let mut rng = StdRng::seed_from_u64(seed ^ 0x4852);
    let samples = (0..=360)
        .map(|k| {
            let minute = k as f64 / 6.0;
            let base = match minute {
                m if m < 10.0 => 95.0 + m * 5.0,
                m if m < 40.0 => 150.0 + 10.0 * (m / 3.0).sin(),
                m if m < 45.0 => 185.0,
                m => 185.0 - 60.0 * (1.0 - (-(m - 45.0) / 3.0).exp()),
            };
            HrSample {
                elapsed_min: minute,
                bpm: (base + rng.gen_range(-3.0_f64..3.0)).round(),
            }
        })
        .collect();
    HrTrace { samples }
}
