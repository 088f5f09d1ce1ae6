//! Пример: чтение записи COMTRADE через LazyRecord
//!
//! Демонстрирует:
//! - разбор CFG без чтения DAT
//! - загрузку тела по требованию
//! - вывод описания записи в JSON
//!
//! Запуск: `cargo run --example read_comtrade_file -- path/to/rec.cfg`

use comtrade_core::LazyRecord;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "comtrade-core/test_input.cfg".to_string());

    // --- Только заголовок ---
    let lazy = match LazyRecord::open(&input_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("✗ CFG parse failed: {e}");
            return Err(Box::new(e));
        }
    };

    let h = lazy.header();
    println!("✓ Header parsed");
    println!("  Station       : {}", h.station_name);
    println!("  Device        : {}", h.recording_device_id);
    println!("  Revision      : {}", h.revision);
    println!("  Encoding      : {}", h.encoding);
    println!("  Channels      : {}A / {}D", h.analog_count(), h.digital_count());
    println!("  Sample Rate   : {} Hz", h.sampling_rate);
    println!("  Total Samples : {}", h.total_samples);
    println!("  Trigger       : {}", h.trigger_time);
    println!("  Data File     : {}", h.data_file_token);

    // --- Тело по требованию ---
    let record = lazy.ensure_body_loaded()?;

    println!("\n✓ Body loaded");
    for ch in record.analog.iter().take(6) {
        println!(
            "  [{}] {:<12} {:>2} {:<3} min={:.3} max={:.3}",
            ch.index,
            ch.name,
            ch.phase.as_str(),
            ch.unit,
            ch.sample_min,
            ch.sample_max
        );
    }

    let switching: Vec<_> = record
        .digital
        .iter()
        .filter(|d| d.has_transition())
        .map(|d| d.name.as_str())
        .collect();
    println!("  Digital transitions: {switching:?}");

    println!("\n{}", serde_json::to_string_pretty(record)?);

    Ok(())
}
