//! Build script for tandem-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates system.toml at compile time
//! - Generates `system_config.rs` with the validated values

use std::env;
use std::fmt::Display;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tandem_core::config::{SystemConfig, TimingConfig};
use tandem_core::task::TaskSpec;

fn main() {
    setup_linker();
    let config = load_config();
    validate_config(&config);
    generate_constants(&config);
}

/// Set up linker search paths and scripts
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SystemToml {
    timing: TimingToml,
    system: SystemSection,
    task: TasksToml,
    model: ModelToml,
    frame: FrameToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TimingToml {
    tick_period_us: u32,
    deadline_threshold_ticks: u32,
    pipeline_idle_ms: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SystemSection {
    max_priority: u8,
    isr_stack_reserve: u32,
    heap_bytes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TasksToml {
    pipeline: TaskToml,
    responder: TaskToml,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaskToml {
    priority: u8,
    stack_bytes: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelToml {
    name: String,
    input: Vec<u32>,
    input_type: String,
    labels: Vec<String>,
    threshold_pct: u8,
    #[serde(default)]
    workload_ms: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FrameToml {
    width: u32,
    height: u32,
}

/// Read and parse system.toml
fn load_config() -> SystemToml {
    // Re-run if system.toml changes
    println!("cargo:rerun-if-changed=system.toml");

    let config_path = Path::new("system.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: system.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a system.toml configuration file.         ║\n\
            ║  Please create one in the tandem-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read system.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid system.toml                                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the core configuration the firmware will assemble at boot
fn system_config(config: &SystemToml) -> SystemConfig {
    SystemConfig {
        timing: TimingConfig {
            tick_period_us: config.timing.tick_period_us,
            deadline_threshold_ticks: config.timing.deadline_threshold_ticks,
            pipeline_idle_ms: config.timing.pipeline_idle_ms,
        },
        pipeline: TaskSpec::new(
            "pipeline",
            config.task.pipeline.priority,
            config.task.pipeline.stack_bytes,
        ),
        responder: TaskSpec::new(
            "responder",
            config.task.responder.priority,
            config.task.responder.stack_bytes,
        ),
        max_priority: config.system.max_priority,
        isr_stack_reserve: config.system.isr_stack_reserve,
    }
}

/// Validate everything the firmware relies on
fn validate_config(config: &SystemToml) {
    let mut errors = Vec::new();

    if let Err(e) = system_config(config).validate() {
        errors.push(format!("[timing]/[task]/[system]: {:?}", e));
    }

    // SysTick reload is 24 bits; at 125 MHz that caps the tick near 134 ms
    if config.timing.tick_period_us > 100_000 {
        errors.push("[timing] tick_period_us must be at most 100000".to_string());
    }

    let heap_bytes = config.system.heap_bytes;
    if heap_bytes == 0 || heap_bytes % 4 != 0 {
        let message = "[system] heap_bytes must be a non-zero multiple of 4";
        errors.push(message.to_string());
    }

    let model = &config.model;
    if model.name.is_empty() {
        errors.push("[model] name cannot be empty".to_string());
    }
    match model.input.as_slice() {
        [w, h, c] if *w > 0 && *h > 0 && (1..=4).contains(c) => {}
        _ => {
            let message = "[model] input must be [width, height, channels] with 1-4 channels";
            errors.push(message.to_string());
        }
    }
    if !["uint8", "int8", "float32"].contains(&model.input_type.as_str()) {
        let message = "[model] input_type must be 'uint8', 'int8', or 'float32'";
        errors.push(message.to_string());
    }
    if model.labels.is_empty() || model.labels.len() > 16 {
        errors.push("[model] labels must list 1-16 classes".to_string());
    }
    if model.threshold_pct > 100 {
        errors.push("[model] threshold_pct must be 0-100".to_string());
    }

    if config.frame.width == 0 || config.frame.height == 0 {
        errors.push("[frame] width and height must be non-zero".to_string());
    }

    // Tensor storage must fit the heap
    if let [w, h, c] = model.input.as_slice() {
        let element = match model.input_type.as_str() {
            "float32" => 4,
            _ => 1,
        };
        let tensors = (*w as u64) * (*h as u64) * (*c as u64) * element + model.labels.len() as u64;
        if tensors > config.system.heap_bytes as u64 {
            errors.push(format!(
                "[model] tensors need {} bytes, heap_bytes is {}",
                tensors, config.system.heap_bytes
            ));
        }
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid system configuration                             ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=system.toml validated successfully");
}

/// Write `system_config.rs` into OUT_DIR
fn generate_constants(config: &SystemToml) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let stack_region = system_config(config)
        .total_stack_budget()
        .unwrap_or_default();

    let timing = &config.timing;
    let system = &config.system;
    let pipeline = &config.task.pipeline;
    let responder = &config.task.responder;
    let model = &config.model;

    let threshold = timing.deadline_threshold_ticks;
    let model_name = format!("{:?}", model.name);
    let input_type = match model.input_type.as_str() {
        "uint8" => "TensorType::UInt8",
        "float32" => "TensorType::Float32",
        _ => "TensorType::Int8",
    };
    let labels = model
        .labels
        .iter()
        .map(|l| format!("{:?}", l))
        .collect::<Vec<_>>()
        .join(", ");
    let labels = format!("&[{}]", labels);

    let mut out = String::new();
    out.push_str("// Generated from system.toml by build.rs\n\n");
    let mut constant = |name: &str, ty: &str, value: &dyn Display| {
        out.push_str(&format!("pub const {}: {} = {};\n", name, ty, value));
    };

    constant("TICK_PERIOD_US", "u32", &timing.tick_period_us);
    constant("DEADLINE_THRESHOLD_TICKS", "u32", &threshold);
    constant("PIPELINE_IDLE_MS", "u32", &timing.pipeline_idle_ms);
    constant("MAX_PRIORITY", "u8", &system.max_priority);
    constant("ISR_STACK_RESERVE", "u32", &system.isr_stack_reserve);
    constant("HEAP_BYTES", "usize", &system.heap_bytes);
    constant("STACK_REGION_BYTES", "usize", &stack_region);
    constant("PIPELINE_PRIORITY", "u8", &pipeline.priority);
    constant("PIPELINE_STACK_BYTES", "u32", &pipeline.stack_bytes);
    constant("RESPONDER_PRIORITY", "u8", &responder.priority);
    constant("RESPONDER_STACK_BYTES", "u32", &responder.stack_bytes);
    constant("MODEL_NAME", "&str", &model_name);
    constant("INPUT_WIDTH", "u32", &model.input[0]);
    constant("INPUT_HEIGHT", "u32", &model.input[1]);
    constant("INPUT_CHANNELS", "u32", &model.input[2]);
    constant("INPUT_TYPE", "TensorType", &input_type);
    constant("LABELS", "&[&str]", &labels);
    constant("THRESHOLD_PCT", "u8", &model.threshold_pct);
    constant("WORKLOAD_MS", "u32", &model.workload_ms);
    constant("FRAME_WIDTH", "u32", &config.frame.width);
    constant("FRAME_HEIGHT", "u32", &config.frame.height);

    fs::write(out_dir.join("system_config.rs"), out).unwrap();
}
