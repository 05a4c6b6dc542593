use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StageTiming {
    pub name: String,
    pub duration: Duration,
}

/// Wall-clock durations of the develop stages, in execution order.
#[derive(Debug, Default)]
pub struct PipelineTimings {
    stages: Vec<StageTiming>,
    stage_map: HashMap<String, Duration>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            stage_map: HashMap::new(),
        }
    }

    pub fn add_stage(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        self.stages.push(StageTiming {
            name: name.clone(),
            duration,
        });
        *self.stage_map.entry(name).or_insert(Duration::ZERO) += duration;
    }

    /// Time a closure and record it under `name`.
    pub fn measure<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = f();
        self.add_stage(name, start.elapsed());
        result
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub fn get_stage(&self, name: &str) -> Option<Duration> {
        self.stage_map.get(name).copied()
    }

    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    pub fn print_summary(&self) {
        let total = self.total_duration();
        println!("\nDevelop Timing Summary:");
        println!("{:-<60}", "");
        for stage in &self.stages {
            let percentage = if total.as_secs_f64() > 0.0 {
                (stage.duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            println!(
                "{:<30} {:>12.3}ms ({:>5.1}%)",
                stage.name,
                stage.duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        println!("{:-<60}", "");
        println!("{:<30} {:>12.3}ms", "Total", total.as_secs_f64() * 1000.0);
    }
}
