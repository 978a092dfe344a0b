//! In-memory stand-in for the ipset utility.
//!
//! Speaks enough of ipset's argument grammar and output format for the
//! library to drive it end to end. Every command runs under one lock, so a
//! command is atomic with respect to concurrent readers just like the kernel.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use ipsetctl::{CommandExecutor, CommandOutput};

pub const IPSET: &str = "/usr/sbin/ipset";
pub const DEFAULT_VERSION: &str = "ipset v7.15, protocol version: 7\n";

#[derive(Debug, Clone)]
struct FakeSet {
    set_type: String,
    header: String,
    members: Vec<String>,
}

impl FakeSet {
    fn terse(&self, name: &str) -> String {
        format!(
            "Name: {}\nType: {}\nRevision: 4\nHeader: {}\n\
             Size in memory: 168\nReferences: 0\nNumber of entries: {}\n",
            name,
            self.set_type,
            self.header,
            self.members.len()
        )
    }
}

#[derive(Debug, Default)]
struct State {
    sets: BTreeMap<String, FakeSet>,
    version_output: Option<String>,
    failing_creates: HashSet<String>,
    rejected_entries: HashSet<String>,
    calls: Vec<Vec<String>>,
}

/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct FakeIpset {
    state: Arc<Mutex<State>>,
}

impl FakeIpset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(self, output: &str) -> Self {
        self.state.lock().unwrap().version_output = Some(output.to_string());
        self
    }

    /// Make `create <name> ...` fail.
    pub fn fail_create(&self, name: &str) {
        self.state.lock().unwrap().failing_creates.insert(name.to_string());
    }

    /// Make `add <any set> <entry>` fail.
    pub fn reject_entry(&self, entry: &str) {
        self.state.lock().unwrap().rejected_entries.insert(entry.to_string());
    }

    pub fn members(&self, name: &str) -> Option<Vec<String>> {
        let state = self.state.lock().unwrap();
        state.sets.get(name).map(|s| s.members.clone())
    }

    /// The "Header:" line of `name`, as ipset would print it.
    pub fn header(&self, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.sets.get(name).map(|s| s.header.clone())
    }

    pub fn set_names(&self) -> Vec<String> {
        self.state.lock().unwrap().sets.keys().cloned().collect()
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }
}

fn missing(name: &str) -> CommandOutput {
    CommandOutput::failed(
        1,
        format!(
            "ipset v7.15: The set with the given name does not exist\n\
             Error in line 1: {}\n",
            name
        ),
    )
}

impl State {
    fn set_mut(&mut self, name: &str) -> Result<&mut FakeSet, CommandOutput> {
        self.sets.get_mut(name).ok_or_else(|| missing(name))
    }

    fn run(&mut self, args: &[String]) -> CommandOutput {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let exist = args.contains(&"-exist");

        match args.as_slice() {
            ["--version"] => CommandOutput::ok(
                self.version_output
                    .clone()
                    .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            ),
            ["-n", "list"] => {
                let mut out = String::new();
                for name in self.sets.keys() {
                    out.push_str(name);
                    out.push('\n');
                }
                CommandOutput::ok(out)
            }
            ["create", name, set_type, rest @ ..] => {
                if self.failing_creates.contains(*name) {
                    return CommandOutput::failed(
                        1,
                        "ipset v7.15: Kernel error received: Operation not permitted\n",
                    );
                }
                if let Some(existing) = self.sets.get(*name) {
                    if !exist || existing.set_type != *set_type {
                        return CommandOutput::failed(
                            1,
                            "ipset v7.15: Set cannot be created: set with the same name already exists\n",
                        );
                    }
                    return CommandOutput::ok("");
                }
                let header = rest
                    .iter()
                    .filter(|a| **a != "-exist")
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ");
                self.sets.insert(
                    name.to_string(),
                    FakeSet {
                        set_type: set_type.to_string(),
                        header,
                        members: Vec::new(),
                    },
                );
                CommandOutput::ok("")
            }
            ["flush"] => {
                self.sets.values_mut().for_each(|s| s.members.clear());
                CommandOutput::ok("")
            }
            ["flush", name] => match self.set_mut(name) {
                Ok(set) => {
                    set.members.clear();
                    CommandOutput::ok("")
                }
                Err(out) => out,
            },
            ["add", name, entry, ..] => {
                if self.rejected_entries.contains(*entry) {
                    return CommandOutput::failed(
                        1,
                        format!("ipset v7.15: Syntax error: '{}' is invalid as number\n", entry),
                    );
                }
                match self.set_mut(name) {
                    Ok(set) => {
                        if set.members.iter().any(|m| m == entry) {
                            if !exist {
                                return CommandOutput::failed(
                                    1,
                                    "ipset v7.15: Element cannot be added to the set: it's already added\n",
                                );
                            }
                        } else {
                            set.members.push(entry.to_string());
                        }
                        CommandOutput::ok("")
                    }
                    Err(out) => out,
                }
            }
            ["del", name, entry, ..] => match self.set_mut(name) {
                Ok(set) => {
                    let before = set.members.len();
                    set.members.retain(|m| m != entry);
                    if before == set.members.len() && !exist {
                        return CommandOutput::failed(
                            1,
                            "ipset v7.15: Element cannot be deleted from the set: it's not added\n",
                        );
                    }
                    CommandOutput::ok("")
                }
                Err(out) => out,
            },
            ["test", name, entry] => match self.sets.get(*name) {
                Some(set) if set.members.iter().any(|m| m == entry) => CommandOutput {
                    stderr: format!("Warning: {} is in set {}.\n", entry, name),
                    ..CommandOutput::ok("")
                },
                Some(_) => CommandOutput::failed(
                    1,
                    format!("ipset v7.15: {} is NOT in set {}.\n", entry, name),
                ),
                None => missing(name),
            },
            ["-t", "list", name] => match self.sets.get(*name) {
                Some(set) => CommandOutput::ok(set.terse(name)),
                None => missing(name),
            },
            ["list", name] => match self.sets.get(*name) {
                Some(set) => {
                    let mut out = set.terse(name);
                    out.push_str("Members:\n");
                    for member in &set.members {
                        out.push_str(member);
                        out.push('\n');
                    }
                    CommandOutput::ok(out)
                }
                None => missing(name),
            },
            ["destroy"] => {
                self.sets.clear();
                CommandOutput::ok("")
            }
            ["destroy", name] => match self.sets.remove(*name) {
                Some(_) => CommandOutput::ok(""),
                None => missing(name),
            },
            ["swap", from, to] => {
                let (Some(a), Some(b)) = (self.sets.get(*from), self.sets.get(*to)) else {
                    return missing(if self.sets.contains_key(*from) { to } else { from });
                };
                if a.set_type != b.set_type {
                    return CommandOutput::failed(
                        1,
                        "ipset v7.15: Sets cannot be swapped: The sets are not compatible\n",
                    );
                }
                let (a, b) = (a.clone(), b.clone());
                self.sets.insert(from.to_string(), b);
                self.sets.insert(to.to_string(), a);
                CommandOutput::ok("")
            }
            _ => CommandOutput::failed(2, "ipset v7.15: Unknown argument\n"),
        }
    }
}

impl CommandExecutor for FakeIpset {
    fn execute(&self, cmd: &str, args: &[String]) -> io::Result<CommandOutput> {
        assert_eq!(cmd, IPSET, "unexpected program");
        let mut state = self.state.lock().unwrap();
        state.calls.push(args.to_vec());
        Ok(state.run(args))
    }
}
