use crate::{
    core::ServiceRef,
    index::{self, ClusterInfo},
    k8s, IngressPolicyDiscover,
};
use anyhow::{bail, Result};
use clap::Parser;
use futures::prelude::*;
use kube::runtime::watcher;
use prometheus_client::registry::Registry;
use std::sync::Arc;
use tracing::{info, info_span, instrument, Instrument};

#[derive(Debug, Parser)]
#[clap(
    name = "ingress-policy",
    about = "Translates Ingress resources into inbound policies"
)]
pub struct Args {
    #[clap(
        long,
        default_value = "linkerd=info,warn",
        env = "LINKERD_INGRESS_POLICY_CONTROLLER_LOG"
    )]
    log_level: kubert::LogFilter,

    #[clap(long, default_value = "plain")]
    log_format: kubert::LogFormat,

    #[clap(flatten)]
    client: kubert::ClientArgs,

    #[clap(flatten)]
    admin: kubert::AdminArgs,

    #[clap(long, default_value = "cluster.local")]
    cluster_domain: String,

    /// Services, as `namespace/name`, whose inbound policies are logged whenever they change.
    #[clap(long = "service")]
    services: Vec<ServiceRef>,
}

impl Args {
    #[inline]
    pub async fn parse_and_run() -> Result<()> {
        Self::parse().run().await
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            admin,
            client,
            log_level,
            log_format,
            cluster_domain,
            services,
        } = self;

        let cluster_info = Arc::new(ClusterInfo {
            dns_domain: cluster_domain,
        });
        let ingress_index = index::Index::shared(cluster_info);

        let mut prom = <Registry>::default();
        index::index::metrics::register(
            prom.sub_registry_with_prefix("ingress_index"),
            ingress_index.clone(),
        );
        let rt_metrics = kubert::RuntimeMetrics::register(prom.sub_registry_with_prefix("kube"));

        let mut runtime = kubert::Runtime::builder()
            .with_log(log_level, log_format)
            .with_metrics(rt_metrics)
            .with_admin(admin.into_builder().with_prometheus(prom))
            .with_client(client)
            .build()
            .await?;

        let ingresses = runtime.watch_all::<k8s::Ingress>(watcher::Config::default());
        tokio::spawn(
            kubert::index::namespaced(ingress_index.clone(), ingresses)
                .instrument(info_span!("ingresses")),
        );

        let discover = IngressPolicyDiscover::new(ingress_index);
        for service in services {
            tokio::spawn(log_policies(discover.clone(), service));
        }

        // Block the main thread on the shutdown signal. Once it fires, wait for the background tasks to
        // complete before exiting.
        if runtime.run().await.is_err() {
            bail!("Aborted");
        }

        Ok(())
    }
}

#[instrument(skip_all, fields(%service))]
async fn log_policies(discover: IngressPolicyDiscover, service: ServiceRef) {
    let mut updates = discover.watch_policies(service);
    while let Some(policies) = updates.next().await {
        match serde_json::to_string(&policies) {
            Ok(json) => info!(policies = %json, "inbound policies updated"),
            Err(error) => tracing::warn!(%error, "failed to serialize inbound policies"),
        }
    }
}
