use prometheus_client::{
    collector::Collector,
    encoding::{DescriptorEncoder, EncodeMetric},
    metrics::{gauge::ConstGauge, MetricType},
    registry::Registry,
};

use super::SharedIndex;

#[derive(Debug)]
struct Instrumented(SharedIndex);

pub fn register(reg: &mut Registry, index: SharedIndex) {
    reg.register_collector(Box::new(Instrumented(index)));
}

impl Collector for Instrumented {
    fn encode(&self, mut encoder: DescriptorEncoder<'_>) -> Result<(), std::fmt::Error> {
        let this = self.0.read();

        let mut ingresses_encoder = encoder.encode_descriptor(
            "ingress_index_size",
            "The number of ingresses in index",
            None,
            MetricType::Gauge,
        )?;
        for (ns, index) in &this.namespaces {
            let labels = [("namespace", ns.as_str())];
            let ingresses = ConstGauge::new(index.ingresses.len() as u32);
            let ingresses_encoder = ingresses_encoder.encode_family(&labels)?;
            ingresses.encode(ingresses_encoder)?;
        }

        let mut watches_encoder = encoder.encode_descriptor(
            "service_policy_watches",
            "The number of services whose ingress policies are watched",
            None,
            MetricType::Gauge,
        )?;
        for (ns, index) in &this.namespaces {
            let labels = [("namespace", ns.as_str())];
            let watches = ConstGauge::new(index.services.len() as u32);
            let watches_encoder = watches_encoder.encode_family(&labels)?;
            watches.encode(watches_encoder)?;
        }

        Ok(())
    }
}
