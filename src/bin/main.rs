// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use rust_decimal::Decimal;
use std::io::{self, BufRead, Write};
use std::process;
use teller_demo_rs::{Engine, Pin, Session};

/// Teller Demo - interactive teller terminal
///
/// Seeds one demo account and reads commands from stdin. The audit trail
/// goes through env_logger; run with RUST_LOG=info to see it.
#[derive(Parser, Debug)]
#[command(name = "teller-demo-rs")]
#[command(about = "A simulated teller terminal with PIN login and lockout", long_about = None)]
struct Args {
    /// PIN (and credential) of the seeded demo account
    #[arg(long, default_value = "1234")]
    seed_pin: String,

    /// Opening balance of the seeded demo account
    #[arg(long, default_value = "1000.00")]
    seed_balance: Decimal,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let seed_pin = match Pin::parse(&args.seed_pin) {
        Ok(pin) => pin,
        Err(e) => {
            eprintln!("Error: invalid --seed-pin '{}': {}", args.seed_pin, e);
            process::exit(1);
        }
    };

    let engine = Engine::new();
    engine.open_account(seed_pin, args.seed_pin.clone(), args.seed_balance);

    println!("teller ready; commands: login <pin> <credential> | balance | withdraw <amt> | deposit <amt> | history | pin <new> | unlock <pin> | logout | quit");

    let stdin = io::stdin();
    let mut session: Option<Session> = None;
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Error reading input: {e}");
                process::exit(1);
            }
        }
        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            continue;
        };

        match command {
            "login" => match (parts.next(), parts.next()) {
                (Some(pin), Some(credential)) => match engine.authenticate(pin, credential) {
                    Ok(granted) => {
                        println!("welcome, {pin}");
                        session = Some(granted);
                    }
                    Err(e) => println!("login failed: {e}"),
                },
                _ => println!("usage: login <pin> <credential>"),
            },
            "balance" => with_session(&session, |s| match engine.balance(s) {
                Ok(balance) => println!("balance: {balance}"),
                Err(e) => println!("error: {e}"),
            }),
            "withdraw" => {
                let amount = parts.next().unwrap_or("");
                with_session(&session, |s| match engine.withdraw(s, amount) {
                    Ok(r) => println!("dispensed {}, new balance {}", r.amount, r.new_balance),
                    Err(e) => println!("withdrawal rejected: {e}"),
                });
            }
            "deposit" => {
                let amount = parts.next().unwrap_or("");
                with_session(&session, |s| match engine.deposit(s, amount) {
                    Ok(r) => println!("accepted {}, new balance {}", r.amount, r.new_balance),
                    Err(e) => println!("deposit rejected: {e}"),
                });
            }
            "history" => with_session(&session, |s| match engine.history(s) {
                Ok(entries) if entries.is_empty() => println!("no transactions"),
                Ok(entries) => {
                    for t in entries {
                        println!("{} {:?} {}", t.timestamp.format("%d/%m/%Y %H:%M:%S"), t.kind, t.amount);
                    }
                }
                Err(e) => println!("error: {e}"),
            }),
            "pin" => {
                let new_pin = parts.next().unwrap_or("");
                match session.as_mut() {
                    Some(s) => match engine.change_pin(s, new_pin) {
                        Ok(()) => println!("PIN changed"),
                        Err(e) => println!("PIN change rejected: {e}"),
                    },
                    None => println!("not logged in"),
                }
            }
            "unlock" => match parts.next().map(Pin::parse) {
                Some(Ok(pin)) => {
                    if engine.unlock(&pin) {
                        println!("unlocked {pin}");
                    } else {
                        println!("no such account");
                    }
                }
                _ => println!("usage: unlock <pin>"),
            },
            "logout" => {
                session = None;
                println!("logged out");
            }
            "quit" | "exit" => break,
            other => println!("unknown command: {other}"),
        }
    }
}

fn with_session(session: &Option<Session>, f: impl FnOnce(&Session)) {
    match session {
        Some(s) => f(s),
        None => println!("not logged in"),
    }
}
