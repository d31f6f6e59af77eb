#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::tests::{agent_auth, send, send_json, test_app, user_auth};

    fn rack(hostname: &str) -> Value {
        json!({
            "rackID": "rack01",
            "hostname": hostname,
            "environment": "PROD",
            "location": "Italy",
            "components": [{
                "hostType": "DOM0",
                "hostname": "exadb01",
                "hostID": "h01",
                "totalCPU": 48,
                "memory": 256,
                "vms": [{
                    "type": "VM_KVM",
                    "name": "vm01",
                    "cpuCurrent": 4,
                    "cpuOnline": 4,
                    "ramCurrent": 32,
                    "ramOnline": 32
                }]
            }]
        })
    }

    #[tokio::test]
    async fn test_exadata_upload_and_listing() {
        let (app, state) = test_app().await;

        let (status, _) = send(&app, Method::POST, "/data/exadata", Some(&user_auth()), Some(rack("exa01"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, Method::POST, "/data/exadata", Some(&agent_auth()), Some(rack("exa01"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state.metrics.get_snapshot().exadata_saved, 1);

        let (status, racks) = send_json(&app, Method::GET, "/exadata", Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::OK);
        let racks = racks.as_array().unwrap();
        assert_eq!(racks.len(), 1);
        assert_eq!(racks[0]["rackID"], "rack01");
        assert_eq!(racks[0]["totalCPU"], 48);
        assert_eq!(racks[0]["usedCPU"], 8);
        assert_eq!(racks[0]["freeCPU"], 40);
        assert_eq!(racks[0]["components"][0]["usedCPUPercentage"], "16%");

        let (_, racks) = send_json(&app, Method::GET, "/exadata?location=Germany", Some(&user_auth()), None).await;
        assert!(racks.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exadata_resubmission_is_merged() {
        let (app, _) = test_app().await;
        send(&app, Method::POST, "/data/exadata", Some(&agent_auth()), Some(rack("exa01"))).await;
        let (status, _) = send(
            &app,
            Method::PUT,
            "/exadata/rack01/components/h01/cluster-names",
            Some(&user_auth()),
            Some(json!({ "clusterNames": ["cl1", "cl2"] })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        send(&app, Method::POST, "/data/exadata", Some(&agent_auth()), Some(rack("exa01-renamed"))).await;

        let (status, rack) = send_json(&app, Method::GET, "/exadata/rack01", Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rack["hostname"], "exa01-renamed");
        assert_eq!(rack["components"].as_array().unwrap().len(), 1);
        assert_eq!(rack["components"][0]["clusterNames"], json!(["cl1", "cl2"]));
    }

    #[tokio::test]
    async fn test_exadata_hide_and_show() {
        let (app, _) = test_app().await;
        send(&app, Method::POST, "/data/exadata", Some(&agent_auth()), Some(rack("exa01"))).await;

        let (status, _) = send(&app, Method::POST, "/exadata/rack01/hide", Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, visible) = send_json(&app, Method::GET, "/exadata", Some(&user_auth()), None).await;
        assert!(visible.as_array().unwrap().is_empty());
        let (_, hidden) = send_json(&app, Method::GET, "/exadata?hidden=true", Some(&user_auth()), None).await;
        assert_eq!(hidden[0]["hidden"], true);

        send(&app, Method::POST, "/exadata/rack01/show", Some(&user_auth()), None).await;
        let (_, visible) = send_json(&app, Method::GET, "/exadata", Some(&user_auth()), None).await;
        assert_eq!(visible.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exadata_user_assignments() {
        let (app, _) = test_app().await;
        send(&app, Method::POST, "/data/exadata", Some(&agent_auth()), Some(rack("exa01"))).await;

        let (status, _) = send(
            &app,
            Method::PUT,
            "/exadata/rack01/components/h01/vms/vm01/cluster-name",
            Some(&user_auth()),
            Some(json!({ "clusterName": "vmcl" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let rdma = json!({ "pingInfiniband": true, "pingRdma": false, "netMask": "255.255.255.0", "ipAddresses": ["10.0.0.1"] });
        let (status, _) = send(&app, Method::PUT, "/exadata/rack01/rdma", Some(&user_auth()), Some(rdma)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, rack) = send_json(&app, Method::GET, "/exadata/rack01", Some(&user_auth()), None).await;
        assert_eq!(rack["components"][0]["vms"][0]["clusterName"], "vmcl");
        assert_eq!(rack["rdma"]["netMask"], "255.255.255.0");
        assert_eq!(rack["rdma"]["pingInfiniband"], true);

        let (status, _) = send(
            &app,
            Method::PUT,
            "/exadata/rack01/components/h01/vms/missing/cluster-name",
            Some(&user_auth()),
            Some(json!({ "clusterName": "vmcl" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_exadata_is_not_found() {
        let (app, _) = test_app().await;
        let (status, body) = send_json(&app, Method::GET, "/exadata/nope", Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (status, _) = send(&app, Method::POST, "/exadata/nope/hide", Some(&user_auth()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
