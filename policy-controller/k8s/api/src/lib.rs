#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod ingress;

pub use self::ingress::{ParsePathTypeError, PathType};
pub use k8s_openapi::{
    api::{
        self,
        networking::v1::{
            HTTPIngressPath, HTTPIngressRuleValue, Ingress, IngressBackend, IngressRule,
            IngressServiceBackend, IngressSpec, ServiceBackendPort,
        },
    },
    apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time},
};
pub use kube::{Resource, ResourceExt};
