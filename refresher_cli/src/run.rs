//! Controller assembly and subcommand execution: config mapping, hardware
//! selection, and the run/plan/self-check entry points.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use refresher_config::Config;
use refresher_core::{
    CMD_PURGE, CommandPort, ConsoleStatus, Dispenser, PUMP_COUNT, Recipe, Size, WATER_INDEX,
    build_dispenser, plan_dispense, runner,
};
use refresher_traits::CommandSource;

pub fn tables_from_config(cfg: &Config) -> (Vec<Recipe>, Vec<Size>) {
    (
        cfg.recipes.iter().map(Recipe::from).collect(),
        cfg.sizes.iter().map(Size::from).collect(),
    )
}

/// Run the controller loop until ctrl-c or channel loss.
pub fn run_controller(
    cfg: &Config,
    serial: Option<&str>,
    poll_hz_override: Option<u32>,
    rt: bool,
    rt_prio: Option<i32>,
) -> eyre::Result<()> {
    #[cfg(all(feature = "rt", target_os = "linux"))]
    crate::rt::setup_rt_once(rt, rt_prio);
    #[cfg(not(all(feature = "rt", target_os = "linux")))]
    let _ = (rt, rt_prio); // silence unused on non-rt builds

    let poll_hz = poll_hz_override.unwrap_or(cfg.channel.poll_hz);
    let (recipes, sizes) = tables_from_config(cfg);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        })
        .wrap_err("install ctrl-c handler")?;
    }

    // Bound each blocking read by one poll period so the reader thread
    // notices shutdown promptly even on a silent line.
    let read_timeout = Duration::from_micros(refresher_core::util::period_us(poll_hz));
    let source = open_source(cfg, serial)?;
    let port = CommandPort::spawn(source, read_timeout);

    let pumps = open_pumps(cfg)?;
    let mut dispenser = build_dispenser(
        pumps,
        ConsoleStatus,
        recipes,
        sizes,
        cfg.dispense.flow_rate_oz_per_s,
        cfg.dispense.pump_power,
        None,
    )?;

    runner::run(&mut dispenser, &port, poll_hz, &shutdown)
}

fn open_source(
    cfg: &Config,
    serial: Option<&str>,
) -> eyre::Result<Box<dyn CommandSource + Send>> {
    let device = serial.or(cfg.channel.device.as_deref());
    #[cfg(feature = "hardware")]
    if let Some(dev) = device {
        let uart = refresher_hardware::pi::UartSource::new(dev, cfg.channel.baud)
            .wrap_err("open serial command source")?;
        return Ok(Box::new(uart));
    }
    #[cfg(not(feature = "hardware"))]
    if let Some(dev) = device {
        tracing::warn!(
            device = dev,
            "serial device configured but this build has no hardware support; using stdin"
        );
    }
    Ok(Box::new(refresher_hardware::StdinSource::spawn()))
}

#[cfg(feature = "hardware")]
fn open_pumps(cfg: &Config) -> eyre::Result<[refresher_hardware::pi::GpioPump; PUMP_COUNT]> {
    refresher_hardware::pi::GpioPump::bank(cfg.pins.pump_pins()).wrap_err("open pump outputs")
}

#[cfg(not(feature = "hardware"))]
fn open_pumps(_cfg: &Config) -> eyre::Result<[refresher_hardware::SimulatedPump; PUMP_COUNT]> {
    Ok(refresher_hardware::SimulatedPump::bank())
}

fn selector_index(letter: char, first: char, count: usize) -> Option<usize> {
    let idx = (letter.to_ascii_uppercase() as i64) - (first as i64);
    (0..count as i64).contains(&idx).then(|| idx as usize)
}

/// Compute and print one order's pour volumes and run times, pumps untouched.
pub fn print_plan(cfg: &Config, recipe_letter: char, size_letter: char, json: bool) -> eyre::Result<()> {
    let (recipes, sizes) = tables_from_config(cfg);

    let ri = selector_index(recipe_letter, 'A', recipes.len())
        .ok_or_else(|| eyre::eyre!("recipe selector '{recipe_letter}' is not on the menu (A-D)"))?;
    let si = selector_index(size_letter, 'W', sizes.len())
        .ok_or_else(|| eyre::eyre!("size selector '{size_letter}' is not on the menu (W-Z)"))?;
    let recipe = &recipes[ri];
    let size = &sizes[si];

    let plan = plan_dispense(recipe, size.ounces, cfg.dispense.flow_rate_oz_per_s);

    if json {
        let obj = serde_json::json!({
            "recipe": recipe.name,
            "size": size.name,
            "ounces": size.ounces,
            "pump_oz": &plan.ounces[..PUMP_COUNT],
            "water_oz": plan.ounces[WATER_INDEX],
            "pump_seconds": plan.pump_seconds,
            "total_seconds": plan.total_seconds(),
        });
        println!("{obj}");
    } else {
        println!("{} ({}, {} oz)", recipe.name, size.name, size.ounces);
        for i in 0..PUMP_COUNT {
            println!(
                "pump {}: {:.2} oz over {:.2} s",
                i + 1,
                plan.ounces[i],
                plan.pump_seconds[i]
            );
        }
        println!("water (not pumped): {:.2} oz", plan.ounces[WATER_INDEX]);
        println!("total run time: {:.2} s", plan.total_seconds());
    }
    Ok(())
}

/// Exercise the simulated stack end to end: build, park, one purge
/// on/off cycle. Cheap enough for operational monitoring.
pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let (recipes, sizes) = tables_from_config(cfg);
    let mut dispenser = Dispenser::builder()
        .with_pumps(refresher_hardware::SimulatedPump::bank())
        .with_status(ConsoleStatus)
        .with_recipes(recipes)
        .with_sizes(sizes)
        .with_flow_rate(cfg.dispense.flow_rate_oz_per_s)
        .with_pump_power(cfg.dispense.pump_power)
        .build()?;

    dispenser.begin()?;
    dispenser.tick(Some(CMD_PURGE))?; // enter the purge cycle
    dispenser.tick(None)?; // all four pumps asserted on
    dispenser.tick(Some(CMD_PURGE))?; // and off again
    println!("self-check ok");
    Ok(())
}
