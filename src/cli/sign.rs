use crate::client::rpc_client::RpcClient;
use crate::sign::SignOutcome;

pub async fn handle_sign_command(client: &RpcClient, data: String, account: Option<String>) {
    println!("Waiting for approval...");
    match client.personal_sign(&data, account.as_deref()).await {
        Ok(res) => match res.outcome {
            SignOutcome::Signed { result } => {
                println!("Request {} signed", res.id);
                println!("{:#}", result);
            }
            SignOutcome::Failed { error } => println!("Request {} failed: {}", res.id, error),
            SignOutcome::Discarded => println!("Request {} was discarded", res.id),
        },
        Err(e) => println!("Sign failed: {}", e),
    }
}

pub async fn handle_pending_command(client: &RpcClient) {
    match client.pending().await {
        Ok(requests) => {
            println!("Pending Requests ({}):", requests.len());
            for r in requests {
                let account = match r.account() {
                    Ok(Some(address)) => address,
                    Ok(None) => "<active>".to_string(),
                    Err(_) => "<malformed>".to_string(),
                };
                println!(" - {} {} {} ({})", r.id, r.method, account, r.created_at);
            }
        }
        Err(e) => println!("Failed to list requests: {}", e),
    }
}

pub async fn handle_approve_command(client: &RpcClient, id: String, password: String) {
    match client.approve(&id, &password).await {
        Ok(res) => println!("Request {} {:?}", res.id, res.state),
        Err(e) => println!("Approve failed: {}", e),
    }
}

pub async fn handle_discard_command(client: &RpcClient, id: String) {
    match client.discard(&id).await {
        Ok(res) => println!("Request {} {:?}", res.id, res.state),
        Err(e) => println!("Discard failed: {}", e),
    }
}
