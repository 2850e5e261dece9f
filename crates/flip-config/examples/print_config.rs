/// Example program to print the loaded configuration
///
/// Run with: cargo run -p flip-config --example print_config

fn main() {
    let config = flip_config::FlipConfig::load();

    println!("=== FLIP Configuration ===\n");

    println!("Animation Settings:");
    println!("  Duration (ms): {}", config.animation.duration_ms);
    println!("  Easing: {}", config.animation.easing);
    println!("  Snap Delay (ms): {}", config.animation.snap_delay_ms);
    println!("  Resync: {:?}", config.animation.resync);
    println!();

    println!("Log Settings:");
    println!("  Filter: {:?}", config.log.filter);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
