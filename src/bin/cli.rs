//! CLI application for running landmark recordings through the
//! retargeting pipeline.
//!
//! Usage:
//!   mimic-rig <recording.json>              # Human-readable output
//!   mimic-rig <recording.json> --json       # JSON output
//!   mimic-rig --demo --plan pro             # Built-in synthetic clip
//!   mimic-rig --demo -o report.json --json  # Save to file

use clap::{Parser, ValueEnum};
use mimic_rig::synthetic::{fist_hand, open_hand, pose_with_lean, upright_pose, FaceBuilder};
use mimic_rig::{LandmarkFrame, PlanTier, Scene, TrackingSession, MORPH_CHANNELS};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PlanArg {
    Free,
    Creator,
    Pro,
    Studio,
}

impl From<PlanArg> for PlanTier {
    fn from(p: PlanArg) -> Self {
        match p {
            PlanArg::Free => PlanTier::Free,
            PlanArg::Creator => PlanTier::Creator,
            PlanArg::Pro => PlanTier::Pro,
            PlanArg::Studio => PlanTier::Studio,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "mimic-rig")]
#[command(author, version, about = "Landmark-to-rig retargeting pipeline", long_about = None)]
struct Args {
    /// Input landmark recording (JSON array of frames)
    #[arg(required_unless_present = "demo")]
    recording: Option<PathBuf>,

    /// Run a built-in synthetic clip instead of a recording
    #[arg(long)]
    demo: bool,

    /// Subscription plan tier to gate capabilities
    #[arg(long, value_enum, default_value_t = PlanArg::Free)]
    plan: PlanArg,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Output {
    source: String,
    plan: String,
    frames_total: usize,
    frames_admitted: usize,
    bound_bones: Vec<String>,
    frames: Vec<FrameOutput>,
}

#[derive(Serialize)]
struct FrameOutput {
    /// Frame index in the recording (0-based)
    index: usize,
    timestamp_ms: f64,
    calibration: String,
    smile: f32,
    mouth_openness: f32,
    mouth_shape: String,
    blinking: bool,
    head_yaw_deg: f32,
    left_gesture: String,
    right_gesture: String,
    posture: String,
    bones_driven: usize,
    morphs_driven: usize,
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let (source, frames) = if args.demo {
        ("demo".to_string(), demo_frames())
    } else {
        let path = args.recording.as_ref().ok_or("No recording given")?;
        if args.verbose {
            eprintln!("Loading recording {:?}...", path);
        }
        let frames = mimic_rig::load_recording(path)?;
        (path.display().to_string(), frames)
    };

    if args.verbose {
        eprintln!("Loaded {} frame(s)", frames.len());
    }

    let mut session = TrackingSession::new(args.plan.into());
    session.attach_scene(demo_scene());
    session.start();

    let mut frame_outputs = Vec::new();
    for (i, frame) in frames.iter().enumerate() {
        let Some(snapshot) = session.advance(frame, frame.timestamp_ms) else {
            continue;
        };
        frame_outputs.push(FrameOutput {
            index: i,
            timestamp_ms: frame.timestamp_ms,
            calibration: match snapshot.calibration {
                mimic_rig::CalibrationState::Collecting { accepted } => {
                    format!("collecting ({accepted}/{})", mimic_rig::CALIBRATION_FRAMES)
                }
                mimic_rig::CalibrationState::Complete => "complete".to_string(),
            },
            smile: snapshot.expression.smile,
            mouth_openness: snapshot.expression.mouth.openness,
            mouth_shape: format!("{:?}", snapshot.expression.mouth.shape),
            blinking: snapshot.expression.eyes.blinking,
            head_yaw_deg: snapshot.expression.head.yaw,
            left_gesture: format!("{:?}", snapshot.gesture.left_hand.gesture),
            right_gesture: format!("{:?}", snapshot.gesture.right_hand.gesture),
            posture: format!("{:?}", snapshot.gesture.body.posture),
            bones_driven: snapshot.stats.bones_driven,
            morphs_driven: snapshot.stats.morphs_driven,
        });
    }

    let output = Output {
        source,
        plan: format!("{:?}", args.plan).to_lowercase(),
        frames_total: frames.len(),
        frames_admitted: frame_outputs.len(),
        bound_bones: session.bound_bones().to_vec(),
        frames: frame_outputs,
    };

    let output_str = if args.json {
        serde_json::to_string_pretty(&output)?
    } else {
        format_human_readable(&output)
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        if args.verbose {
            eprintln!("Output written to {:?}", path);
        }
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

/// Humanoid stand-in asset: full priority rig plus every morph channel the
/// engine drives.
fn demo_scene() -> Scene {
    let mut scene = Scene::new(1);
    let root = scene.root();
    let armature = scene.add_node(root, "Armature");
    let bones: Vec<_> = mimic_rig::BONE_PRIORITY
        .iter()
        .map(|name| scene.add_node(armature, name))
        .collect();
    scene.attach_skeleton(armature, bones);
    let face = scene.add_node(root, "Face");
    scene.attach_morphs(face, &MORPH_CHANNELS);
    scene
}

/// Synthetic 30fps clip: calibration, a wink, speech, a smile, a head turn,
/// and a lean with a fist.
fn demo_frames() -> Vec<LandmarkFrame> {
    let dt = 1000.0 / 30.0;
    let mut frames = Vec::new();
    let mut t = 0.0;
    let mut push = |frames: &mut Vec<LandmarkFrame>, builder: &FaceBuilder, hand: Vec<_>, pose: Vec<_>| {
        let mut frame = builder.build_frame();
        frame.timestamp_ms = t;
        frame.left_hand = Some(hand);
        frame.pose = Some(pose);
        frames.push(frame);
        t += dt;
    };

    let neutral = FaceBuilder::neutral();
    for _ in 0..35 {
        push(&mut frames, &neutral, open_hand(), upright_pose());
    }

    let mut wink = FaceBuilder::neutral();
    wink.set_ear(true, 0.05);
    for _ in 0..10 {
        push(&mut frames, &wink, open_hand(), upright_pose());
    }

    let mut talk = FaceBuilder::neutral();
    talk.set_mouth_openness(0.8);
    for _ in 0..10 {
        push(&mut frames, &talk, open_hand(), upright_pose());
    }

    let mut smile = FaceBuilder::neutral();
    smile.set_corner_lift(0.8);
    for _ in 0..10 {
        push(&mut frames, &smile, open_hand(), upright_pose());
    }

    let mut turn = FaceBuilder::neutral();
    turn.set_head_yaw(30.0);
    for _ in 0..10 {
        push(&mut frames, &turn, open_hand(), upright_pose());
    }

    for _ in 0..10 {
        push(&mut frames, &neutral, fist_hand(), pose_with_lean(25.0));
    }

    frames
}

fn format_human_readable(output: &Output) -> String {
    let mut s = String::new();

    s.push_str(&format!("Source: {} ({} plan)\n", output.source, output.plan));
    s.push_str(&format!(
        "Frames: {} total, {} admitted by the scheduler\n",
        output.frames_total, output.frames_admitted
    ));
    s.push_str(&format!(
        "Bound bones ({}): {}\n",
        output.bound_bones.len(),
        output.bound_bones.join(", ")
    ));

    if output.frames.is_empty() {
        s.push_str("\nNo frames admitted.\n");
        return s;
    }

    for frame in &output.frames {
        s.push_str(&format!(
            "\n--- Frame {} ({:.0}ms, calibration {}) ---\n",
            frame.index, frame.timestamp_ms, frame.calibration
        ));
        s.push_str(&format!(
            "Mouth: {} ({:.0}% open), smile {:.0}%\n",
            frame.mouth_shape,
            frame.mouth_openness * 100.0,
            frame.smile * 100.0
        ));
        s.push_str(&format!(
            "Eyes: {}, head yaw {:.1} deg\n",
            if frame.blinking { "blinking" } else { "open" },
            frame.head_yaw_deg
        ));
        s.push_str(&format!(
            "Hands: L {} / R {}, posture {}\n",
            frame.left_gesture, frame.right_gesture, frame.posture
        ));
        s.push_str(&format!(
            "Applied: {} bones, {} morphs\n",
            frame.bones_driven, frame.morphs_driven
        ));
    }

    s
}
