//! The console reporter (C13): a plain, redrawing stdout table standing in
//! for a curses UI treated as an external collaborator. It proves the
//! engine's public state is consumable end to end without trying to
//! reproduce a curses grid - no color, no scrollback, no keyboard input.

use pingmon_core::target::estimate_hop_count;
use pingmon_core::Engine;

pub struct ConsoleReporter {
    show_stats: bool,
    show_hops: bool,
}

impl ConsoleReporter {
    pub fn new(show_stats: bool, show_hops: bool) -> Self {
        Self {
            show_stats,
            show_hops,
        }
    }

    fn clear(&self) {
        print!("{esc}[2J{esc}[1;1H", esc = 27 as char);
    }

    /// Redraw the whole table from a fresh snapshot of `engine`.
    pub fn render(&self, engine: &Engine) {
        self.clear();
        println!("pingmon  seq={}  tseq={}", engine.seq(), engine.tseq());
        println!();
        for (i, target) in engine.targets.iter().enumerate() {
            if let Some(header) = &target.header {
                println!("> {header}");
            }
            let selected = if i == engine.selected() { '*' } else { ' ' };
            target.with_state(|s| {
                let rtt = s
                    .last_rtt_ms
                    .map(|v| format!("{v:7.1} ms"))
                    .unwrap_or_else(|| "    ---   ".to_string());
                let hops = s
                    .last_ttl
                    .map(|ttl| estimate_hop_count(ttl).to_string())
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "{selected} {:<24} {:<16} {rtt}  hops~{hops:>2}  lost={:<6} late={:<6}",
                    target.name,
                    target.host,
                    s.stats.lost(),
                    s.stats.late(),
                );
                if self.show_stats {
                    println!(
                        "      n={:<6} min={:>7.1} avg={:>7.1} max={:>7.1} std={:>7.1}",
                        s.stats.n(),
                        s.stats.min().unwrap_or(-1.0),
                        s.stats.avg().unwrap_or(-1.0),
                        s.stats.max().unwrap_or(-1.0),
                        s.stats.std().unwrap_or(-1.0),
                    );
                }
            });
        }

        if self.show_hops {
            println!();
            println!("traceroute to target #{} (nhop={})", engine.selected(), engine.trace.nhop());
            for (ttl, hop) in engine.trace.hops().iter().enumerate().take(engine.trace.nhop()) {
                let ttl = ttl + 1;
                hop.with_state(|s| {
                    let cell = if s.last_rtt_ms < 0.0 {
                        "unrch".to_string()
                    } else if s.last_rtt_ms == 0.0 {
                        "   ---".to_string()
                    } else {
                        format!("{:6.1}", s.last_rtt_ms)
                    };
                    let ip = s
                        .last_responder
                        .map(|ip| ip.to_string())
                        .unwrap_or_else(|| "?".to_string());
                    println!("  {ttl:>2}  {cell}  {ip}");
                });
            }
        }
    }
}
