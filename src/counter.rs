use std::cmp::Reverse;
use std::collections::HashMap;

/// Per-login tally that ranks by count descending, then login ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedCounter {
    name: String,
    counts: HashMap<String, u64>,
}

impl RankedCounter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            counts: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn increment(&mut self, login: &str) {
        *self.counts.entry(login.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, login: &str) -> u64 {
        self.counts.get(login).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn rank(&self) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|(login, count)| (login.clone(), *count))
            .collect();
        ranked.sort_by(|(a_login, a_count), (b_login, b_count)| {
            (Reverse(a_count), a_login).cmp(&(Reverse(b_count), b_login))
        });
        ranked
    }

    /// Header line followed by one `count login` line per ranked entry.
    pub fn table_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.len() + 1);
        lines.push(format!("{}:", self.name));
        lines.extend(
            self.rank()
                .into_iter()
                .map(|(login, count)| format!("{count:>6} {login}")),
        );
        lines
    }
}
