use conformal_track_finder::config::synthetic;
use conformal_track_finder::io::write_json_file;
use conformal_track_finder::synthetic::generate_event;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn usage() -> String {
    "Usage: synthetic_event <config.json>".to_string()
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = synthetic::load_config(Path::new(&config_path)).map_err(|e| e.to_string())?;

    let event = generate_event(&config.geometry, &config.event);
    write_json_file(&config.hits_out, &event.records)?;
    println!(
        "{} hits from {} tracks written to {}",
        event.records.len(),
        event.truth.len(),
        config.hits_out.display()
    );
    if let Some(path) = &config.truth_out {
        write_json_file(path, &event.truth)?;
        println!("Truth written to {}", path.display());
    }
    Ok(())
}
