use anyhow::Result;
use aws_config::meta::region::RegionProviderChain;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{Builder as S3ConfigBuilder, Region},
    Client as S3Client,
};

use crate::config::StorageConfig;

pub async fn build_client(config: &StorageConfig) -> Result<S3Client> {
    let region = Region::new(config.region.clone());
    let region_provider = RegionProviderChain::first_try(Some(region))
        .or_default_provider()
        .or_else("us-east-1");

    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "static",
    );

    #[allow(deprecated)]
    let base_config = aws_config::from_env()
        .region(region_provider)
        .endpoint_url(&config.endpoint_url)
        .credentials_provider(credentials)
        .load()
        .await;
    let s3_config = S3ConfigBuilder::from(&base_config)
        .force_path_style(true)
        .build();

    Ok(S3Client::from_conf(s3_config))
}
