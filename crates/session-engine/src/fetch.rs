use brief_core::{
    CrudeOil, GiftNifty, GlobalMarket, IndexQuote, InstitutionalFlows, MarketDataSource,
    NewsItem, OptionsPositioning, Perspectives, PivotLevels, RunClock, RupeeRate, Sentiment,
    Session, Topic, VixReading,
};
use serde::de::DeserializeOwned;

/// Result of asking the data source for one topic.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub value: T,
    /// True when the fetch or decode failed and `value` is the topic default.
    pub used_default: bool,
}

impl<T> Fetched<T> {
    pub fn fresh(value: T) -> Self {
        Self {
            value,
            used_default: false,
        }
    }

    pub fn defaulted(value: T) -> Self {
        Self {
            value,
            used_default: true,
        }
    }
}

/// Topics refreshed on every run.
#[derive(Debug, Clone, PartialEq)]
pub struct IntradayData {
    pub nifty: Fetched<IndexQuote>,
    pub vix: Fetched<VixReading>,
    pub news: Fetched<Vec<NewsItem>>,
}

/// Topics refreshed only by the morning run.
#[derive(Debug, Clone, PartialEq)]
pub struct MorningData {
    pub gift: Fetched<GiftNifty>,
    pub crude: Fetched<CrudeOil>,
    pub inr: Fetched<RupeeRate>,
    pub fiidii: Fetched<InstitutionalFlows>,
    pub pivot: Fetched<PivotLevels>,
    pub oi: Fetched<OptionsPositioning>,
    pub global_markets: Fetched<Vec<GlobalMarket>>,
    pub sentiment: Fetched<Sentiment>,
    pub perspectives: Fetched<Perspectives>,
}

/// Everything fetched for one run. `morning` is only populated for the
/// morning session.
#[derive(Debug, Clone, PartialEq)]
pub struct FreshData {
    pub intraday: IntradayData,
    pub morning: Option<MorningData>,
}

impl FreshData {
    /// Topics that fell back to their default this run.
    pub fn degraded(&self) -> Vec<Topic> {
        let mut flags = vec![
            (Topic::Nifty, self.intraday.nifty.used_default),
            (Topic::Vix, self.intraday.vix.used_default),
            (Topic::News, self.intraday.news.used_default),
        ];
        if let Some(m) = &self.morning {
            flags.extend([
                (Topic::Gift, m.gift.used_default),
                (Topic::Crude, m.crude.used_default),
                (Topic::Inr, m.inr.used_default),
                (Topic::FiiDii, m.fiidii.used_default),
                (Topic::Pivot, m.pivot.used_default),
                (Topic::Oi, m.oi.used_default),
                (Topic::GlobalMarkets, m.global_markets.used_default),
                (Topic::Sentiment, m.sentiment.used_default),
                (Topic::Perspectives, m.perspectives.used_default),
            ]);
        }
        flags
            .into_iter()
            .filter(|(_, degraded)| *degraded)
            .map(|(topic, _)| topic)
            .collect()
    }
}

/// Fetch and decode one topic. Any failure degrades to `T::default()`.
pub async fn fetch_or_default<T>(
    source: &dyn MarketDataSource,
    topic: Topic,
    clock: &RunClock,
) -> Fetched<T>
where
    T: DeserializeOwned + Default,
{
    tracing::debug!("Fetching {} via {}", topic.label(), source.name());

    let raw = match source.fetch_topic(topic, clock).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("{} fetch failed, using default: {}", topic.label(), e);
            return Fetched::defaulted(T::default());
        }
    };

    match serde_json::from_value::<T>(raw) {
        Ok(value) => Fetched::fresh(value),
        Err(e) => {
            tracing::warn!("{} returned malformed data, using default: {}", topic.label(), e);
            Fetched::defaulted(T::default())
        }
    }
}

/// Fetch the topics appropriate for `session`.
pub async fn collect_fresh(
    source: &dyn MarketDataSource,
    session: Session,
    clock: &RunClock,
) -> FreshData {
    let (nifty, vix, news) = tokio::join!(
        fetch_or_default(source, Topic::Nifty, clock),
        fetch_or_default(source, Topic::Vix, clock),
        fetch_or_default(source, Topic::News, clock),
    );
    let intraday = IntradayData { nifty, vix, news };

    let morning = if session.is_morning() {
        tracing::info!("Full morning brief fetch");
        Some(collect_morning(source, clock).await)
    } else {
        None
    };

    FreshData { intraday, morning }
}

async fn collect_morning(source: &dyn MarketDataSource, clock: &RunClock) -> MorningData {
    let (gift, crude, inr, fiidii, pivot, oi, global_markets, sentiment, perspectives) = tokio::join!(
        fetch_or_default(source, Topic::Gift, clock),
        fetch_or_default(source, Topic::Crude, clock),
        fetch_or_default(source, Topic::Inr, clock),
        fetch_or_default(source, Topic::FiiDii, clock),
        fetch_or_default(source, Topic::Pivot, clock),
        fetch_or_default(source, Topic::Oi, clock),
        fetch_or_default(source, Topic::GlobalMarkets, clock),
        fetch_or_default(source, Topic::Sentiment, clock),
        fetch_or_default(source, Topic::Perspectives, clock),
    );

    MorningData {
        gift,
        crude,
        inr,
        fiidii,
        pivot,
        oi,
        global_markets,
        sentiment,
        perspectives,
    }
}
