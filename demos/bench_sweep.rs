/**
 * Bench Sweep
 *
 * Runs one full sweep against a simulated stand and synthetic scan feed,
 * without the topic-driven command path:
 * - steps the stand from 0 to 90 degrees
 * - pairs each angle with the latest synthetic scan
 * - collects the sweep and prints per-cycle timing statistics
 *
 * Usage: cargo run --example bench_sweep [slices]
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use tilt_scan::pubsub::{Publisher, Subscriber, Topic};
use tilt_scan::scan_buffer::{ScanBuffer, ScanFeed};
use tilt_scan::sim::{SimulatedStand, SyntheticScanSource};
use tilt_scan::{RangeSample, RunState, RunStateController, SliceAcquirer, SliceCollector, SnapshotPolicy};

const DEFAULT_SLICES: usize = 50;

fn main() -> tilt_scan::Result<()>{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let slices: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_SLICES);

    let topic = Arc::new(Topic::<RangeSample>::new("/scan", 8));
    let scans = Arc::new(ScanBuffer::new());
    let _feed = ScanFeed::spawn(Subscriber::new(Arc::clone(&topic)), Arc::clone(&scans))?;
    let _source = SyntheticScanSource::spawn(Publisher::new(Arc::clone(&topic)), Duration::from_millis(20), 4.0)?;

    let stand = SimulatedStand::new(0.0, 90.0 / slices as f64, 0.0, 90.0)?.with_step_delay(Duration::from_millis(2));
    let run_state = Arc::new(RunStateController::new(RunState::Enabled));
    let mut acquirer = SliceAcquirer::new(stand, SliceCollector::new(), scans, run_state, SnapshotPolicy::default());

    let mut cycle_times: Vec<Duration> = Vec::with_capacity(slices);
    let mut failures = 0;
    for _ in 0..slices{
        let start = Instant::now();
        match acquirer.obtain_slice(){
            Ok(_) => cycle_times.push(start.elapsed()),
            Err(e) =>{
                failures += 1;
                log::warn!("Cycle failed: {}", e);
            }
        }
    }

    let (_, collector) = acquirer.into_parts();
    cycle_times.sort();

    println!("\n========== Sweep Summary ==========");
    println!("Slices:        {}", collector.len());
    println!("Failures:      {}", failures);
    println!("Readings:      {}", collector.reading_count());
    if let (Some(first), Some(last)) = (collector.slices().first(), collector.slices().last()){
        println!("Tilt range:    {:.2} .. {:.2} deg", first.tilt_angle, last.tilt_angle);
    }
    if !cycle_times.is_empty(){
        let total: Duration = cycle_times.iter().sum();
        println!("Cycle min:     {:?}", cycle_times[0]);
        println!("Cycle median:  {:?}", cycle_times[cycle_times.len() / 2]);
        println!("Cycle max:     {:?}", cycle_times[cycle_times.len() - 1]);
        println!("Cycle mean:    {:?}", total / cycle_times.len() as u32);
    }
    println!("===================================");
    Ok(())
}
