use powerwatch_core::{
    MetricsSource, SecurityStateMachine, Sensitivity, StatusSnapshot, SystemMetricsSource,
};

/// One-shot status: take a single sample, classify it, print, exit.
pub fn run(json: bool) {
    let mut source = SystemMetricsSource::new();
    let sample = match source.sample() {
        Ok(sample) => sample,
        Err(e) => {
            eprintln!("Cannot read system metrics: {e}");
            std::process::exit(1);
        }
    };

    let sensitivity = Sensitivity::default();
    let mut machine = SecurityStateMachine::new();
    machine.evaluate(&sample, sensitivity);

    let snapshot = StatusSnapshot::capture(
        false,
        machine.status(),
        machine.incidents(),
        sensitivity,
        Some(&sample),
        None,
    );

    if json {
        match snapshot.to_json() {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Cannot serialize snapshot: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    println!("powerwatch {}", powerwatch_core::VERSION);
    println!("  status       {}", snapshot.status);
    println!(
        "  sensitivity  {} (threshold {:.0} %)",
        snapshot.sensitivity, snapshot.threshold_percent
    );
    match snapshot.battery {
        Some(b) => {
            let plug = if b.plugged { "plugged in" } else { "on battery" };
            println!("  battery      {:.0} % ({plug})", b.percent);
        }
        None => println!("  battery      none"),
    }
    if let Some(cpu) = snapshot.cpu_percent {
        println!("  cpu          {cpu:.1} %");
    }
    if let Some(memory) = snapshot.memory_percent {
        println!("  memory       {memory:.1} %");
    }
}
