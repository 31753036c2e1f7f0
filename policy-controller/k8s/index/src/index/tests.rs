use super::*;
use kubert::index::IndexNamespacedResource;
use linkerd_ingress_policy_core::inbound::RoutingDomain;
use linkerd_ingress_policy_k8s_api::{
    HTTPIngressPath, HTTPIngressRuleValue, IngressBackend, IngressRule, IngressServiceBackend,
    IngressSpec, ObjectMeta,
};
use tokio::time;
use tracing::Level;

struct TestConfig {
    index: SharedIndex,
}

impl Default for TestConfig {
    fn default() -> Self {
        tracing_subscriber::fmt()
            .with_max_level(Level::TRACE)
            .try_init()
            .ok();

        let cluster = ClusterInfo {
            dns_domain: "cluster.example.com".to_string(),
        };
        Self {
            index: Index::shared(Arc::new(cluster)),
        }
    }
}

fn backend(service: &str) -> IngressBackend {
    IngressBackend {
        service: Some(IngressServiceBackend {
            name: service.to_string(),
            port: None,
        }),
        ..Default::default()
    }
}

fn mk_ingress(
    ns: impl ToString,
    name: impl ToString,
    host: &str,
    path: &str,
    service: &str,
) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            namespace: Some(ns.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(vec![IngressRule {
                host: Some(host.to_string()),
                http: Some(HTTPIngressRuleValue {
                    paths: vec![HTTPIngressPath {
                        path: Some(path.to_string()),
                        path_type: "Prefix".to_string(),
                        backend: backend(service),
                    }],
                }),
            }]),
            ..Default::default()
        }),
        status: None,
    }
}

fn rule_count(policies: &InboundPolicySet, host: &str) -> usize {
    policies
        .get(&RoutingDomain::host(host))
        .map(|p| p.rules.len())
        .unwrap_or(0)
}

#[test]
fn watch_tracks_ingresses() {
    let test = TestConfig::default();
    let svc = ServiceRef::new("ns-0", "web");

    let mut rx = test.index.write().policy_rx(svc.clone());
    assert!(rx.borrow_and_update().is_empty());

    // Create an ingress that routes to the service.
    test.index
        .write()
        .apply(mk_ingress("ns-0", "ingress-a", "a.example.com", "/a", "web"));
    assert!(rx.has_changed().unwrap());
    {
        let policies = rx.borrow_and_update();
        assert_eq!(policies.len(), 1);
        let policy = policies.iter().next().unwrap();
        assert_eq!(policy.name, "ingress-a.ns-0|a.example.com");
        assert_eq!(
            policy.rules[0].backends[0].cluster,
            "web.ns-0.svc.cluster.example.com"
        );
    }

    // Add a path on the same host from another ingress.
    test.index
        .write()
        .apply(mk_ingress("ns-0", "ingress-b", "a.example.com", "/b", "web"));
    assert!(rx.has_changed().unwrap());
    assert_eq!(rule_count(&rx.borrow_and_update(), "a.example.com"), 2);

    // Delete the first ingress.
    test.index
        .write()
        .delete("ns-0".to_string(), "ingress-a".to_string());
    assert!(rx.has_changed().unwrap());
    {
        let policies = rx.borrow_and_update();
        assert_eq!(rule_count(&policies, "a.example.com"), 1);
        assert_eq!(
            policies.iter().next().unwrap().name,
            "ingress-b.ns-0|a.example.com"
        );
    }

    // Delete the second ingress.
    test.index
        .write()
        .delete("ns-0".to_string(), "ingress-b".to_string());
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_empty());
}

#[test]
fn unrelated_ingresses_do_not_update_watch() {
    let test = TestConfig::default();
    let mut rx = test.index.write().policy_rx(ServiceRef::new("ns-0", "web"));
    let _ = rx.borrow_and_update();

    // Another service in the same namespace.
    test.index
        .write()
        .apply(mk_ingress("ns-0", "ingress-a", "a.example.com", "/", "api"));
    assert!(!rx.has_changed().unwrap());

    // The same service name in another namespace.
    test.index
        .write()
        .apply(mk_ingress("ns-1", "ingress-a", "a.example.com", "/", "web"));
    assert!(!rx.has_changed().unwrap());

    // Deleting an unknown ingress is a no-op.
    test.index
        .write()
        .delete("ns-0".to_string(), "ingress-z".to_string());
    assert!(!rx.has_changed().unwrap());
}

#[test]
fn ingress_moves_between_services() {
    let test = TestConfig::default();
    let mut web = test.index.write().policy_rx(ServiceRef::new("ns-0", "web"));
    let mut api = test.index.write().policy_rx(ServiceRef::new("ns-0", "api"));

    test.index
        .write()
        .apply(mk_ingress("ns-0", "ingress-a", "a.example.com", "/", "web"));
    assert!(!web.borrow_and_update().is_empty());
    assert!(api.borrow_and_update().is_empty());

    test.index
        .write()
        .apply(mk_ingress("ns-0", "ingress-a", "a.example.com", "/", "api"));
    assert!(web.has_changed().unwrap());
    assert!(web.borrow_and_update().is_empty());
    assert!(api.has_changed().unwrap());
    assert!(!api.borrow_and_update().is_empty());
}

#[test]
fn subscribing_late_sees_current_state() {
    let test = TestConfig::default();
    test.index
        .write()
        .apply(mk_ingress("ns-0", "ingress-a", "a.example.com", "/", "web"));

    let rx = test.index.write().policy_rx(ServiceRef::new("ns-0", "web"));
    assert_eq!(rule_count(&rx.borrow(), "a.example.com"), 1);

    // A second subscriber shares the same watch.
    let rx2 = test.index.write().policy_rx(ServiceRef::new("ns-0", "web"));
    assert!(rx.same_channel(&rx2));
}

#[test]
fn older_ingress_names_policy() {
    let test = TestConfig::default();
    let svc = ServiceRef::new("ns-0", "web");

    // Without creation timestamps, ingresses are ordered by name.
    test.index
        .write()
        .apply(mk_ingress("ns-0", "ingress-b", "a.example.com", "/", "web"));
    test.index
        .write()
        .apply(mk_ingress("ns-0", "ingress-a", "a.example.com", "/", "web"));

    let policies = test.index.read().inbound_policies(&svc).unwrap();
    assert_eq!(policies.len(), 1);
    let policy = policies.iter().next().unwrap();
    assert_eq!(policy.name, "ingress-a.ns-0|a.example.com");
    assert_eq!(policy.rules.len(), 1);
}

#[test]
fn discover_unknown_namespace() {
    let test = TestConfig::default();
    let ingresses = test
        .index
        .read()
        .get_ingress_resources(&ServiceRef::new("ns-9", "web"))
        .unwrap();
    assert!(ingresses.is_empty());
}

#[test]
fn closed_watches_are_dropped() {
    let test = TestConfig::default();
    let rx = test.index.write().policy_rx(ServiceRef::new("ns-0", "web"));
    drop(rx);

    test.index
        .write()
        .apply(mk_ingress("ns-0", "ingress-a", "a.example.com", "/", "web"));
    let index = test.index.read();
    let ns = index.namespaces.get("ns-0").expect("namespace must be indexed");
    assert!(ns.services.is_empty());
}

#[test]
fn empty_namespaces_are_dropped() {
    let test = TestConfig::default();
    let rx = test.index.write().policy_rx(ServiceRef::new("ns-0", "web"));
    assert!(test.index.read().namespaces.contains_key("ns-0"));
    drop(rx);

    test.index
        .write()
        .apply(mk_ingress("ns-0", "ingress-a", "a.example.com", "/", "api"));
    test.index
        .write()
        .delete("ns-0".to_string(), "ingress-a".to_string());
    assert!(!test.index.read().namespaces.contains_key("ns-0"));

    // A namespace with an open watch is kept.
    let _rx = test.index.write().policy_rx(ServiceRef::new("ns-1", "web"));
    test.index
        .write()
        .apply(mk_ingress("ns-1", "ingress-a", "a.example.com", "/", "web"));
    test.index
        .write()
        .delete("ns-1".to_string(), "ingress-a".to_string());
    assert!(test.index.read().namespaces.contains_key("ns-1"));
}

#[tokio::test]
async fn watch_notifies_waiters() {
    let test = TestConfig::default();
    let mut rx = test.index.write().policy_rx(ServiceRef::new("ns-0", "web"));

    let index = test.index.clone();
    tokio::spawn(async move {
        index
            .write()
            .apply(mk_ingress("ns-0", "ingress-a", "", "/", "web"));
    });

    time::timeout(time::Duration::from_secs(1), rx.changed())
        .await
        .expect("watch must be notified")
        .expect("index must not be dropped");
    assert_eq!(rule_count(&rx.borrow(), ""), 1);
}
