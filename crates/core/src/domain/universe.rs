use crate::domain::risk::RiskBucket;

// Ticker lists per bucket, in analysis order.
const UNIVERSE: [(RiskBucket, &[&str]); 3] = [
    (RiskBucket::High, &["AAPL", "TSLA", "GOOGL", "NVDA", "NFLX"]),
    (RiskBucket::Medium, &["AMZN", "FB", "MSFT", "DIS", "PYPL"]),
    (RiskBucket::Low, &["JNJ", "JPM", "BRK.B", "V", "PG", "KO"]),
];

pub fn tickers_for(bucket: RiskBucket) -> &'static [&'static str] {
    UNIVERSE
        .iter()
        .find(|(b, _)| *b == bucket)
        .map(|(_, tickers)| *tickers)
        .unwrap_or(&[])
}

pub fn all() -> impl Iterator<Item = (RiskBucket, &'static [&'static str])> {
    UNIVERSE.iter().copied()
}
