// ============================================================================
// TickerSet : user-supplied ticker symbols
// ============================================================================
// Parsed from space-separated text input ("AAPL MSFT GOOG"). Order is
// preserved, duplicates collapse, symbols are uppercased. Whether a symbol
// actually exists is only discovered at fetch time.
// ============================================================================

/// Ordered, non-empty set of ticker symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerSet {
    symbols: Vec<String>,
}

impl TickerSet {
    /// Parses space-separated input. Returns `None` when no symbol remains
    /// after trimming; the set is never empty.
    pub fn parse(input: &str) -> Option<Self> {
        let mut symbols: Vec<String> = Vec::new();
        for token in input.split_whitespace() {
            let symbol = token.to_uppercase();
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        if symbols.is_empty() {
            None
        } else {
            Some(Self { symbols })
        }
    }

    pub fn single(symbol: &str) -> Self {
        Self {
            symbols: vec![symbol.to_uppercase()],
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        false // parse and single never produce an empty set
    }

    /// Exactly one ticker selected; gates the candlestick and volume views.
    pub fn is_single(&self) -> bool {
        self.symbols.len() == 1
    }

    pub fn first(&self) -> &str {
        &self.symbols[0]
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.symbols.iter()
    }

    /// Display label, e.g. "AAPL MSFT". Also the fetch-cache key prefix.
    pub fn label(&self) -> String {
        self.symbols.join(" ")
    }
}

// ============================================================================
// Tests
// ============================================================================
