//! A line-oriented REPL for exercising a [`subpool::registry::Registry`] by
//! hand. Not a product CLI: a thin demonstration and manual-test harness for
//! the library.
//!
//! Commands:
//!
//! ```text
//! open <size> <best-fit|first-fit>
//! alloc <pool> <size>
//! free <pool> <alloc>
//! inspect <pool>
//! close <pool>
//! quit
//! ```
//!
//! Pool and allocation indices printed/read by this driver are positional
//! (the Nth pool opened, the Nth allocation handle returned by that pool),
//! not the library's own opaque ids, so a human can type them without
//! copy-pasting a `Debug` dump.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use subpool::prelude::*;

struct Session {
    registry: Registry,
    pools: Vec<PoolId>,
    allocs: HashMap<usize, Vec<Option<Allocation>>>,
}

impl Session {
    fn new() -> Result<Self> {
        Ok(Self {
            registry: Registry::init().context("failed to initialize registry")?,
            pools: Vec::new(),
            allocs: HashMap::new(),
        })
    }

    fn pool_id(&self, index: usize) -> Result<PoolId> {
        self.pools
            .get(index)
            .copied()
            .ok_or_else(|| anyhow!("no such pool: {index}"))
    }

    fn open(&mut self, size: u64, policy: Policy) -> Result<usize> {
        let id = self
            .registry
            .open(size, policy)?
            .ok_or_else(|| anyhow!("registry has no free slot"))?;
        let index = self.pools.len();
        self.pools.push(id);
        self.allocs.insert(index, Vec::new());
        Ok(index)
    }

    fn alloc(&mut self, pool_index: usize, size: u64) -> Result<usize> {
        let id = self.pool_id(pool_index)?;
        let pool = self
            .registry
            .get_mut(id)
            .ok_or_else(|| anyhow!("pool {pool_index} is not open"))?;
        let allocation = pool.allocate(size)?;
        let slots = self.allocs.entry(pool_index).or_default();
        slots.push(Some(allocation));
        Ok(slots.len() - 1)
    }

    fn free(&mut self, pool_index: usize, alloc_index: usize) -> Result<()> {
        let id = self.pool_id(pool_index)?;
        let slots = self
            .allocs
            .get_mut(&pool_index)
            .ok_or_else(|| anyhow!("pool {pool_index} has no allocations"))?;
        let slot = slots
            .get_mut(alloc_index)
            .ok_or_else(|| anyhow!("no such allocation: {alloc_index}"))?;
        let allocation = slot.take().ok_or_else(|| anyhow!("allocation already freed"))?;
        let pool = self
            .registry
            .get_mut(id)
            .ok_or_else(|| anyhow!("pool {pool_index} is not open"))?;
        pool.free(allocation)?;
        Ok(())
    }

    fn inspect(&self, pool_index: usize) -> Result<Vec<Segment>> {
        let id = self.pool_id(pool_index)?;
        let pool = self
            .registry
            .get(id)
            .ok_or_else(|| anyhow!("pool {pool_index} is not open"))?;
        Ok(pool.inspect())
    }

    fn close(&mut self, pool_index: usize) -> Result<()> {
        let id = self.pool_id(pool_index)?;
        self.registry.close(id)?;
        Ok(())
    }
}

fn parse_policy(token: &str) -> Result<Policy> {
    match token {
        "best-fit" => Ok(Policy::BestFit),
        "first-fit" => Ok(Policy::FirstFit),
        other => bail!("unknown policy: {other} (expected best-fit or first-fit)"),
    }
}

fn dispatch(session: &mut Session, line: &str) -> Result<Option<String>> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    match command {
        "open" => {
            let size: u64 = words
                .next()
                .context("usage: open <size> <best-fit|first-fit>")?
                .parse()?;
            let policy = parse_policy(
                words
                    .next()
                    .context("usage: open <size> <best-fit|first-fit>")?,
            )?;
            let index = session.open(size, policy)?;
            Ok(Some(format!("pool {index}")))
        }
        "alloc" => {
            let pool: usize = words.next().context("usage: alloc <pool> <size>")?.parse()?;
            let size: u64 = words.next().context("usage: alloc <pool> <size>")?.parse()?;
            let index = session.alloc(pool, size)?;
            Ok(Some(format!("alloc {index}")))
        }
        "free" => {
            let pool: usize = words.next().context("usage: free <pool> <alloc>")?.parse()?;
            let alloc: usize = words.next().context("usage: free <pool> <alloc>")?.parse()?;
            session.free(pool, alloc)?;
            Ok(Some("ok".to_string()))
        }
        "inspect" => {
            let pool: usize = words.next().context("usage: inspect <pool>")?.parse()?;
            let segments = session.inspect(pool)?;
            let rendered = segments
                .iter()
                .map(|s| format!("{}:{}", s.size, if s.reserved { "reserved" } else { "free" }))
                .collect::<Vec<_>>()
                .join(" ");
            Ok(Some(rendered))
        }
        "close" => {
            let pool: usize = words.next().context("usage: close <pool>")?.parse()?;
            session.close(pool)?;
            Ok(Some("ok".to_string()))
        }
        "quit" | "exit" => std::process::exit(0),
        other => bail!("unknown command: {other}"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let mut session = Session::new()?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read from stdin")?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match dispatch(&mut session, trimmed) {
            Ok(Some(output)) => println!("{output}"),
            Ok(None) => {}
            Err(err) => eprintln!("error: {err}"),
        }
        stdout.flush().ok();
    }
    Ok(())
}
