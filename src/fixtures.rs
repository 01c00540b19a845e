#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::decode::{Decode, Decoder};
    use crate::error::BoxError;
    use crate::settings::{Member, Settings};

    #[derive(Debug, Default)]
    pub struct Embedded {
        pub enabled: bool,
        pub embedded_port: u16,
    }

    crate::settings!(Embedded {
        enabled: leaf,
        embedded_port: leaf = "env:PORT",
    });

    #[derive(Debug, Default)]
    pub struct Nested {
        pub nest_value: String,
    }

    crate::settings!(Nested { nest_value: leaf });

    /// A composite that decodes itself from `scheme://host`.
    #[derive(Debug, Default, PartialEq)]
    pub struct Label {
        pub scheme: String,
        pub host: String,
    }

    impl Decoder for Label {
        fn decode(&mut self, raw: &str) -> Result<(), BoxError> {
            let (scheme, host) = raw
                .split_once("://")
                .ok_or_else(|| format!("'{raw}' is not scheme://host"))?;
            self.scheme = scheme.to_string();
            self.host = host.to_string();
            Ok(())
        }
    }

    impl Decode for Label {
        fn decoder(&mut self) -> Option<&mut dyn Decoder> {
            Some(self)
        }
    }

    impl Settings for Label {
        fn members(&mut self) -> Vec<Member<'_>> {
            vec![
                Member::leaf("scheme", "", &mut self.scheme),
                Member::leaf("host", "", &mut self.host),
            ]
        }

        fn as_leaf(&mut self) -> Option<&mut dyn Decode> {
            Some(self)
        }
    }

    #[derive(Debug, Default)]
    pub struct Upstream {
        pub url: String,
    }

    crate::settings!(Upstream { url: leaf });

    /// Exercises every member kind and most annotation directives.
    #[derive(Debug, Default)]
    pub struct Spec {
        pub embedded: Embedded,
        pub nested: Nested,
        pub debug: bool,
        pub rate: f64,
        pub port: u16,
        pub timeout: Duration,
        pub ratios: Vec<f64>,
        pub map_field: HashMap<String, String>,
        pub secret: String,
        pub ignored: String,
        pub internal: u32,
        pub no_env: String,
        pub label: Label,
        pub upstream: Option<Upstream>,
    }

    crate::settings!(Spec {
        embedded: embedded,
        nested: nested,
        debug: leaf = "cli:debug,cli-short:d,cli-usage:verbose output",
        rate: leaf = "default:0.5",
        port: leaf = "env:HTTP_PORT,default:8080,cli:port",
        timeout: leaf = "default:30s",
        ratios: leaf = "default:list(0.5;1.5)",
        map_field: leaf = "default:map(one|two;three|four)",
        secret: leaf = "mask,pstore:global",
        ignored: leaf = "-",
        internal: private,
        no_env: leaf = "env:-,default:fallback",
        label: nested,
        upstream: optional,
    });

    #[derive(Debug, Default)]
    pub struct Unannotated {
        pub host_name: String,
        pub port: u16,
        pub http_server: String,
    }

    crate::settings!(Unannotated {
        host_name: leaf,
        port: leaf,
        http_server: leaf,
    });

    #[derive(Debug, Default)]
    pub struct AllIgnored {
        pub first: String,
        pub second: u32,
    }

    crate::settings!(AllIgnored {
        first: leaf = "-",
        second: leaf = "-",
    });

    /// A nested composite that contributes no key segment.
    #[derive(Debug, Default)]
    pub struct Flattened {
        pub nested: Nested,
    }

    crate::settings!(Flattened { nested: nested = "env:-" });

    #[derive(Debug, Default)]
    pub struct Required {
        pub my_field: String,
        pub other: String,
    }

    crate::settings!(Required {
        my_field: leaf = "env:MY_FIELD,required",
        other: leaf = "env:OTHER,required",
    });

    /// Parameter-store and reporting directives.
    #[derive(Debug, Default)]
    pub struct Service {
        pub host: String,
        pub password: String,
        pub token: String,
        pub region: String,
        pub log_level: String,
        pub local_only: String,
        pub app_name: String,
    }

    crate::settings!(Service {
        host: leaf = "default:localhost",
        password: leaf = "mask,pstore:/shared/db/password",
        token: leaf = "no-print,pstore:global",
        region: leaf = "env:AWS_REGION,no-prefix",
        log_level: leaf = "default:info",
        local_only: leaf = "pstore:-",
        app_name: leaf = "env:APP_NAME,no-prefix",
    });
}
